use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every evaluation pass produces Events.
/// The CLI prints them as JSON; a GUI shell would poll for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    LocationUpdated {
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
        at: DateTime<Utc>,
    },
    AlarmTriggered {
        alarm_id: String,
        name: String,
        distance_m: f64,
        at: DateTime<Utc>,
    },
    /// Alarm left its radius and may fire again on re-entry.
    AlarmRearmed {
        alarm_id: String,
        at: DateTime<Utc>,
    },
    /// One-shot alarm fired and was switched off.
    AlarmDeactivated {
        alarm_id: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        total_alarms: usize,
        active_alarms: usize,
        fired: Vec<String>,
        at: DateTime<Utc>,
    },
}
