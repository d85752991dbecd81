//! Notification boundary.
//!
//! Presenting an alert and playing audio are platform services; the core
//! only defines the seam. [`ConsoleNotifier`] is the CLI's stand-in: a
//! terminal bell plus a stderr line, honoring the notification preferences.

use std::path::Path;

use crate::alarm::{Alarm, AlarmSound};
use crate::storage::NotificationsConfig;

pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

/// Presents a fired alarm to the user. Fire-and-forget: the trigger handler
/// logs a failure and still counts the alarm as fired.
pub trait Notifier {
    fn notify(&self, alarm: &Alarm, distance_m: f64) -> Result<(), NotifyError>;
}

/// Terminal notifier used by the CLI.
pub struct ConsoleNotifier {
    config: NotificationsConfig,
}

impl ConsoleNotifier {
    pub fn new(config: NotificationsConfig) -> Self {
        Self { config }
    }

    fn sound_name(&self, alarm: &Alarm) -> Result<String, NotifyError> {
        // A configured custom sound overrides the alarm's own; a missing
        // file is this notifier's playback failure.
        if let Some(path) = &self.config.custom_sound {
            if !Path::new(path).exists() {
                return Err(format!("custom sound not found: {path}").into());
            }
            return Ok(path.clone());
        }
        if let AlarmSound::Custom(path) = &alarm.sound {
            if !Path::new(path).exists() {
                return Err(format!("alarm sound not found: {path}").into());
            }
        }
        Ok(alarm.sound.to_string())
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, alarm: &Alarm, distance_m: f64) -> Result<(), NotifyError> {
        if !self.config.enabled {
            return Ok(());
        }
        let sound = self.sound_name(alarm)?;
        // \x07 rings the terminal bell; the closest thing to audio we own.
        eprintln!(
            "\x07ALARM {name}: within {distance_m:.0} m (sound: {sound}, volume: {volume})",
            name = alarm.name,
            volume = self.config.volume,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_notifier_is_a_noop() {
        let notifier = ConsoleNotifier::new(NotificationsConfig {
            enabled: false,
            ..NotificationsConfig::default()
        });
        let alarm = Alarm::new("Office", 41.0, 29.0, 100.0);
        assert!(notifier.notify(&alarm, 12.0).is_ok());
    }

    #[test]
    fn missing_custom_sound_is_a_playback_failure() {
        let notifier = ConsoleNotifier::new(NotificationsConfig {
            custom_sound: Some("/definitely/not/here.ogg".into()),
            ..NotificationsConfig::default()
        });
        let alarm = Alarm::new("Office", 41.0, 29.0, 100.0);
        assert!(notifier.notify(&alarm, 12.0).is_err());
    }

    #[test]
    fn builtin_sounds_always_play() {
        let notifier = ConsoleNotifier::new(NotificationsConfig::default());
        let mut alarm = Alarm::new("Office", 41.0, 29.0, 100.0);
        alarm.sound = AlarmSound::Bell;
        assert!(notifier.notify(&alarm, 12.0).is_ok());
    }
}
