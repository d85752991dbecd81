//! Location fixes and feeds.
//!
//! The platform location service is an external collaborator: it produces a
//! stream of fixes at a configured minimum distance/time interval. The core
//! only defines the fix shape and a [`LocationFeed`] trait; the CLI wires a
//! JSONL reader (stdin or a replay file) into it.

use std::io::BufRead;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// A single position report from the location feed.
///
/// Only latitude/longitude are required; the remaining fields mirror what
/// platform feeds attach to a fix and are kept for the durable fix log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            speed: None,
            heading: None,
            timestamp: Utc::now(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A source of position updates.
///
/// `next_fix` returns `Ok(None)` when the feed is exhausted.
pub trait LocationFeed {
    fn next_fix(&mut self) -> Result<Option<LocationFix>, std::io::Error>;
}

/// Feed that reads one JSON-encoded fix per line.
///
/// Blank lines are skipped; a malformed line ends the feed with an error so
/// the caller can surface it once and stop.
pub struct JsonlFeed<R: BufRead> {
    reader: R,
}

impl<R: BufRead> JsonlFeed<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LocationFeed for JsonlFeed<R> {
    fn next_fix(&mut self) -> Result<Option<LocationFix>, std::io::Error> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.reader.read_line(&mut line)?;
            if n == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return serde_json::from_str::<LocationFix>(trimmed)
                .map(Some)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn jsonl_feed_reads_fixes_in_order() {
        let input = concat!(
            "{\"latitude\": 41.0, \"longitude\": 28.9}\n",
            "\n",
            "{\"latitude\": 41.1, \"longitude\": 29.0, \"accuracy\": 5.0}\n",
        );
        let mut feed = JsonlFeed::new(Cursor::new(input));

        let first = feed.next_fix().unwrap().unwrap();
        assert_eq!(first.latitude, 41.0);
        assert!(first.accuracy.is_none());

        let second = feed.next_fix().unwrap().unwrap();
        assert_eq!(second.accuracy, Some(5.0));

        assert!(feed.next_fix().unwrap().is_none());
    }

    #[test]
    fn malformed_line_is_an_error() {
        let mut feed = JsonlFeed::new(Cursor::new("not json\n"));
        assert!(feed.next_fix().is_err());
    }

    #[test]
    fn fix_roundtrips_through_json() {
        let fix = LocationFix::new(41.0082, 28.9784);
        let json = serde_json::to_string(&fix).unwrap();
        let back: LocationFix = serde_json::from_str(&json).unwrap();
        assert_eq!(back.latitude, fix.latitude);
        assert_eq!(back.longitude, fix.longitude);
    }
}
