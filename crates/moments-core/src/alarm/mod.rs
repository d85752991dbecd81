//! Alarm records and the logic that fires them.
//!
//! An alarm ties a name to a target location and radius, optionally gated by
//! a time of day. The store persists the list, the evaluator decides which
//! alarms cross their trigger condition, and the trigger handler carries out
//! the side effects of a firing.

pub mod evaluator;
pub mod store;
pub mod trigger;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::geo::Coordinates;

pub use evaluator::{EvalPolicy, Evaluation, Evaluator, FiredSet};
pub use store::AlarmStore;
pub use trigger::{TriggerHandler, TriggerReport};

/// Which audio asset the notifier should play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmSound {
    Default,
    Chime,
    Bell,
    /// Path to a user-provided sound file.
    Custom(String),
}

impl Default for AlarmSound {
    fn default() -> Self {
        AlarmSound::Default
    }
}

impl FromStr for AlarmSound {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "default" => AlarmSound::Default,
            "chime" => AlarmSound::Chime,
            "bell" => AlarmSound::Bell,
            other => AlarmSound::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for AlarmSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmSound::Default => write!(f, "default"),
            AlarmSound::Chime => write!(f, "chime"),
            AlarmSound::Bell => write!(f, "bell"),
            AlarmSound::Custom(path) => write!(f, "{path}"),
        }
    }
}

/// A user-defined alarm: a target location, a trigger radius, and an
/// optional time-of-day gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    /// Unique id, generated at creation.
    pub id: String,

    /// User label.
    pub name: String,

    pub latitude: f64,
    pub longitude: f64,

    /// Trigger distance threshold in meters.
    pub radius_m: f64,

    /// Whether the time-of-day gate applies.
    #[serde(default)]
    pub time_based: bool,

    /// Time-of-day gate value. Ignored when `time_based` is false.
    #[serde(default)]
    pub time: Option<NaiveTime>,

    #[serde(default)]
    pub sound: AlarmSound,

    /// Inactive alarms are skipped by the evaluator.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Deactivate after firing once.
    #[serde(default)]
    pub one_time: bool,
}

fn default_active() -> bool {
    true
}

impl Alarm {
    /// Create an active alarm with a fresh id and no time gate.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, radius_m: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            latitude,
            longitude,
            radius_m,
            time_based: false,
            time: None,
            sound: AlarmSound::Default,
            active: true,
            one_time: false,
        }
    }

    /// Add a time-of-day gate.
    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time_based = true;
        self.time = Some(time);
        self
    }

    /// Mark as one-shot.
    pub fn one_shot(mut self) -> Self {
        self.one_time = true;
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Check the record invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(self.radius_m > 0.0) {
            return Err(ValidationError::InvalidRadius(self.radius_m));
        }
        if self.time_based && self.time.is_none() {
            return Err(ValidationError::MissingTime(self.name.clone()));
        }
        Ok(())
    }
}

/// One full evaluation pass, shared by the foreground watch loop and the
/// background check command.
///
/// Loads the list and the fired set, evaluates, fires triggers through the
/// handler, persists the fired set, and returns the pass's events in order.
/// All state flows through the store; the two execution contexts never share
/// an in-memory handle.
pub fn run_pass(
    db: &crate::storage::Database,
    config: &crate::storage::Config,
    notifier: &dyn crate::notify::Notifier,
    fix: &crate::location::LocationFix,
    now: NaiveTime,
) -> Result<Vec<crate::events::Event>, crate::error::CoreError> {
    use crate::events::Event;

    let store = AlarmStore::new(db);
    let alarms = store.load()?;
    let fired = store.load_fired()?;

    let evaluator = Evaluator::new(EvalPolicy::from(&config.evaluator));
    let evaluation = evaluator.evaluate(fix, now, &alarms, &fired);

    let mut events = vec![Event::LocationUpdated {
        latitude: fix.latitude,
        longitude: fix.longitude,
        accuracy: fix.accuracy,
        at: fix.timestamp,
    }];

    let handler = TriggerHandler::new(db, notifier);
    for id in &evaluation.triggered {
        if let Some(report) = handler.handle(id, fix)? {
            let at = chrono::Utc::now();
            events.push(Event::AlarmTriggered {
                alarm_id: report.alarm_id.clone(),
                name: report.name.clone(),
                distance_m: report.distance_m,
                at,
            });
            if report.deactivated {
                events.push(Event::AlarmDeactivated {
                    alarm_id: report.alarm_id,
                    at,
                });
            }
        }
    }

    for id in &evaluation.rearmed {
        events.push(Event::AlarmRearmed {
            alarm_id: id.clone(),
            at: chrono::Utc::now(),
        });
    }

    store.save_fired(&evaluation.fired)?;
    Ok(events)
}

/// Current store state as a snapshot event.
pub fn snapshot(
    db: &crate::storage::Database,
) -> Result<crate::events::Event, crate::error::CoreError> {
    let store = AlarmStore::new(db);
    let alarms = store.load()?;
    let fired = store.load_fired()?;
    Ok(crate::events::Event::StateSnapshot {
        total_alarms: alarms.len(),
        active_alarms: alarms.iter().filter(|a| a.active).count(),
        fired: fired.ids().map(str::to_string).collect(),
        at: chrono::Utc::now(),
    })
}
