//! SQLite-backed persistence.
//!
//! Provides durable storage for:
//! - The key-value table holding the alarm list and the fired set
//! - Trigger history (one row per alarm firing)
//! - The ingested location-fix log, trimmed to the most recent fixes
//!
//! The foreground watch loop and background check passes are separate
//! processes sharing this file; single-statement writes keep each update
//! atomic from the caller's perspective, and a busy database surfaces as
//! [`StoreError::Locked`].

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::error::StoreError;
use crate::location::LocationFix;

/// How many ingested fixes to keep.
pub const MAX_STORED_FIXES: usize = 500;

/// One row of trigger history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub id: i64,
    pub alarm_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_m: f64,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_triggers: u64,
    pub today_triggers: u64,
    pub last_fired_at: Option<DateTime<Utc>>,
}

/// SQLite database for alarm state, trigger history and the fix log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/moments/moments.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()
            .map_err(|e| StoreError::DataDir(e.to_string()))?
            .join("moments.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS triggers (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                alarm_id   TEXT NOT NULL,
                name       TEXT NOT NULL,
                latitude   REAL NOT NULL,
                longitude  REAL NOT NULL,
                distance_m REAL NOT NULL,
                fired_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fixes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                latitude    REAL NOT NULL,
                longitude   REAL NOT NULL,
                accuracy    REAL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_triggers_fired_at ON triggers(fired_at);
            CREATE INDEX IF NOT EXISTS idx_triggers_alarm_id ON triggers(alarm_id);",
        )?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    // ── Trigger history ──────────────────────────────────────────────

    /// Record an alarm firing.
    pub fn record_trigger(
        &self,
        alarm_id: &str,
        name: &str,
        latitude: f64,
        longitude: f64,
        distance_m: f64,
        fired_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO triggers (alarm_id, name, latitude, longitude, distance_m, fired_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alarm_id,
                name,
                latitude,
                longitude,
                distance_m,
                fired_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent firings, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<TriggerRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, alarm_id, name, latitude, longitude, distance_m, fired_at
             FROM triggers ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, alarm_id, name, latitude, longitude, distance_m, fired_at) = row?;
            let fired_at = DateTime::parse_from_rfc3339(&fired_at)
                .map_err(|e| StoreError::QueryFailed(format!("bad fired_at: {e}")))?
                .with_timezone(&Utc);
            records.push(TriggerRecord {
                id,
                alarm_id,
                name,
                latitude,
                longitude,
                distance_m,
                fired_at,
            });
        }
        Ok(records)
    }

    /// Delete all history rows; returns how many were removed.
    pub fn clear_history(&self) -> Result<usize, StoreError> {
        let n = self.conn.execute("DELETE FROM triggers", [])?;
        Ok(n)
    }

    pub fn stats(&self) -> Result<Stats, StoreError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (total, today_count, last) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN fired_at >= ?1 THEN 1 ELSE 0 END), 0),
                    MAX(fired_at)
             FROM triggers",
            params![format!("{today}T00:00:00+00:00")],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )?;

        let last_fired_at = match last {
            Some(s) => Some(
                DateTime::parse_from_rfc3339(&s)
                    .map_err(|e| StoreError::QueryFailed(format!("bad fired_at: {e}")))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(Stats {
            total_triggers: total,
            today_triggers: today_count,
            last_fired_at,
        })
    }

    // ── Fix log ──────────────────────────────────────────────────────

    /// Append a fix and trim the log to [`MAX_STORED_FIXES`].
    pub fn record_fix(&self, fix: &LocationFix) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO fixes (latitude, longitude, accuracy, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fix.latitude,
                fix.longitude,
                fix.accuracy,
                fix.timestamp.to_rfc3339(),
            ],
        )?;
        self.conn.execute(
            "DELETE FROM fixes WHERE id NOT IN
             (SELECT id FROM fixes ORDER BY id DESC LIMIT ?1)",
            params![MAX_STORED_FIXES as i64],
        )?;
        Ok(())
    }

    /// The most recently ingested fix, if any.
    pub fn latest_fix(&self) -> Result<Option<LocationFix>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT latitude, longitude, accuracy, recorded_at
                 FROM fixes ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((latitude, longitude, accuracy, recorded_at)) => {
                let timestamp = DateTime::parse_from_rfc3339(&recorded_at)
                    .map_err(|e| StoreError::QueryFailed(format!("bad recorded_at: {e}")))?
                    .with_timezone(&Utc);
                Ok(Some(LocationFix {
                    latitude,
                    longitude,
                    accuracy,
                    altitude: None,
                    speed: None,
                    heading: None,
                    timestamp,
                }))
            }
        }
    }

    pub fn fix_count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM fixes", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
