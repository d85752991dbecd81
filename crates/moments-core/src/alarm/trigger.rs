//! Trigger handling.
//!
//! Carries out the side effects of a firing: notify, deactivate one-shot
//! alarms, persist the updated list, and append a history row. The
//! evaluator guarantees an id appears at most once per pass; this handler
//! additionally skips an already-deactivated one-shot, so a duplicate call
//! is harmless.

use chrono::Utc;
use log::{debug, warn};

use super::store::AlarmStore;
use crate::error::StoreError;
use crate::geo::distance_m;
use crate::location::LocationFix;
use crate::notify::Notifier;
use crate::storage::Database;

/// What happened when an alarm fired.
#[derive(Debug, Clone)]
pub struct TriggerReport {
    pub alarm_id: String,
    pub name: String,
    pub distance_m: f64,
    /// Whether the notifier ran without error.
    pub notified: bool,
    /// Whether a one-shot alarm was switched off.
    pub deactivated: bool,
}

/// Executes firings decided by the evaluator.
pub struct TriggerHandler<'a> {
    db: &'a Database,
    notifier: &'a dyn Notifier,
}

impl<'a> TriggerHandler<'a> {
    pub fn new(db: &'a Database, notifier: &'a dyn Notifier) -> Self {
        Self { db, notifier }
    }

    /// Fire one alarm.
    ///
    /// Returns `Ok(None)` for an unknown id or an already-deactivated
    /// one-shot (both logged, neither fatal). A notifier error is logged
    /// and the alarm still counts as fired: the history row is written and
    /// a one-shot is still deactivated.
    pub fn handle(
        &self,
        alarm_id: &str,
        fix: &LocationFix,
    ) -> Result<Option<TriggerReport>, StoreError> {
        let store = AlarmStore::new(self.db);
        let mut alarms = store.load()?;

        let Some(alarm) = alarms.iter_mut().find(|a| a.id == alarm_id) else {
            warn!("trigger for unknown alarm id {alarm_id}");
            return Ok(None);
        };

        if alarm.one_time && !alarm.active {
            debug!("one-shot alarm {alarm_id} already fired, skipping");
            return Ok(None);
        }

        let d = distance_m(fix.coordinates(), alarm.coordinates());

        let notified = match self.notifier.notify(alarm, d) {
            Ok(()) => true,
            Err(e) => {
                warn!("notification for alarm '{}' failed: {e}", alarm.name);
                false
            }
        };

        let mut deactivated = false;
        if alarm.one_time {
            alarm.active = false;
            deactivated = true;
        }

        let report = TriggerReport {
            alarm_id: alarm.id.clone(),
            name: alarm.name.clone(),
            distance_m: d,
            notified,
            deactivated,
        };

        self.db.record_trigger(
            &report.alarm_id,
            &report.name,
            fix.latitude,
            fix.longitude,
            d,
            Utc::now(),
        )?;

        if deactivated {
            store.save(&alarms)?;
        }

        Ok(Some(report))
    }
}
