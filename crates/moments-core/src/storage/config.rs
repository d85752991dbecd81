//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Location feed cadence (minimum interval / distance between fixes)
//! - Notification preferences
//! - Evaluator policy (time-gate tolerance, re-arm behavior, default radius)
//!
//! Configuration is stored at `~/.config/moments/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::alarm::EvalPolicy;

/// Location feed configuration.
///
/// Cadence hints for the watch loop: moves shorter than `min_distance_m`
/// are recorded but not evaluated, and replayed feeds are paced at
/// `min_interval_secs` per fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,
    #[serde(default = "default_min_distance")]
    pub min_distance_m: f64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: u32,
    #[serde(default = "default_true")]
    pub vibration: bool,
    /// Path to a custom notification sound file (optional).
    /// If set, this file is played instead of the alarm's own sound.
    #[serde(default)]
    pub custom_sound: Option<String>,
}

/// Evaluator policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Half-width of the time-of-day gate window, in seconds.
    #[serde(default = "default_time_tolerance")]
    pub time_tolerance_secs: u32,
    /// Whether leaving the radius re-arms a fired alarm.
    #[serde(default = "default_true")]
    pub rearm_on_exit: bool,
    /// Radius used when an alarm is created without one.
    #[serde(default = "default_radius")]
    pub default_radius_m: f64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/moments/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

// Default functions
fn default_min_interval() -> u64 {
    5
}
fn default_min_distance() -> f64 {
    10.0
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u32 {
    50
}
fn default_time_tolerance() -> u32 {
    60
}
fn default_radius() -> f64 {
    100.0
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
            min_distance_m: default_min_distance(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
            vibration: true,
            custom_sound: None,
        }
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            time_tolerance_secs: default_time_tolerance(),
            rearm_on_exit: true,
            default_radius_m: default_radius(),
        }
    }
}

impl From<&EvaluatorConfig> for EvalPolicy {
    fn from(cfg: &EvaluatorConfig) -> Self {
        EvalPolicy {
            time_tolerance_secs: cfg.time_tolerance_secs,
            rearm_on_exit: cfg.rearm_on_exit,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err("config key is empty".into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| format!("cannot parse '{value}' as number"))?
                        } else {
                            return Err(format!("cannot parse '{value}' as number").into());
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }

        Err(format!("unknown config key: {key}").into())
    }

    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.location.min_interval_secs, 5);
        assert_eq!(parsed.evaluator.time_tolerance_secs, 60);
        assert!(parsed.evaluator.rearm_on_exit);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("evaluator.default_radius_m").as_deref(), Some("100.0"));
        assert!(cfg.get("evaluator.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_bool() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "evaluator.rearm_on_exit", "false").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "evaluator.rearm_on_exit").unwrap(),
            &serde_json::Value::Bool(false)
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "evaluator.time_tolerance_secs", "120").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "evaluator.time_tolerance_secs").unwrap(),
            &serde_json::Value::Number(120.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "evaluator.nonexistent", "1");
        assert!(result.is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result =
            Config::set_json_value_by_path(&mut json, "notifications.enabled", "not_a_bool");
        assert!(result.is_err());
    }

    #[test]
    fn eval_policy_follows_config() {
        let mut cfg = EvaluatorConfig::default();
        cfg.time_tolerance_secs = 30;
        cfg.rearm_on_exit = false;
        let policy = EvalPolicy::from(&cfg);
        assert_eq!(policy.time_tolerance_secs, 30);
        assert!(!policy.rearm_on_exit);
    }
}
