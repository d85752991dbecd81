//! Alarm storage and persistence.
//!
//! The alarm list is the sole source of truth, persisted as a JSON array
//! under a fixed key in the database's key-value table. The whole list is
//! loaded at the start of an evaluation pass and saved after every mutation;
//! each save is a single-statement overwrite, so readers never observe a
//! partial write. The fired set shares the same table under its own key.

use log::warn;

use super::evaluator::FiredSet;
use super::Alarm;
use crate::error::{CoreError, StoreError, ValidationError};
use crate::storage::Database;

const ALARMS_KEY: &str = "alarms";
const FIRED_KEY: &str = "fired";

/// CRUD over the persisted alarm list.
pub struct AlarmStore<'a> {
    db: &'a Database,
}

impl<'a> AlarmStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load the last-persisted list, or empty.
    ///
    /// A corrupt value is logged and treated as empty rather than failing
    /// the whole pass; the next save overwrites it.
    pub fn load(&self) -> Result<Vec<Alarm>, StoreError> {
        match self.db.kv_get(ALARMS_KEY)? {
            None => Ok(Vec::new()),
            Some(json) => match serde_json::from_str(&json) {
                Ok(alarms) => Ok(alarms),
                Err(e) => {
                    warn!("alarm list unreadable, starting empty: {e}");
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Overwrite the persisted list.
    pub fn save(&self, alarms: &[Alarm]) -> Result<(), StoreError> {
        let json = serde_json::to_string(alarms)
            .map_err(|e| StoreError::QueryFailed(format!("serialize alarms: {e}")))?;
        self.db.kv_set(ALARMS_KEY, &json)
    }

    /// Validate and append a new alarm.
    pub fn add(&self, alarm: Alarm) -> Result<Alarm, CoreError> {
        alarm.validate()?;
        let mut alarms = self.load()?;
        if alarms.iter().any(|a| a.id == alarm.id) {
            return Err(ValidationError::DuplicateId(alarm.id).into());
        }
        alarms.push(alarm.clone());
        self.save(&alarms)?;
        Ok(alarm)
    }

    pub fn get(&self, id: &str) -> Result<Option<Alarm>, StoreError> {
        Ok(self.load()?.into_iter().find(|a| a.id == id))
    }

    /// Replace the record with the same id. Returns false if absent.
    pub fn update(&self, alarm: Alarm) -> Result<bool, CoreError> {
        alarm.validate()?;
        let mut alarms = self.load()?;
        match alarms.iter_mut().find(|a| a.id == alarm.id) {
            Some(slot) => {
                *slot = alarm;
                self.save(&alarms)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete by id. Returns false if absent.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut alarms = self.load()?;
        let before = alarms.len();
        alarms.retain(|a| a.id != id);
        if alarms.len() == before {
            return Ok(false);
        }
        self.save(&alarms)?;
        Ok(true)
    }

    /// Flip the active toggle. Returns false if absent.
    pub fn set_active(&self, id: &str, active: bool) -> Result<bool, StoreError> {
        let mut alarms = self.load()?;
        match alarms.iter_mut().find(|a| a.id == id) {
            Some(alarm) => {
                alarm.active = active;
                self.save(&alarms)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ── Fired set ────────────────────────────────────────────────────

    /// De-duplication state shared by both execution contexts.
    pub fn load_fired(&self) -> Result<FiredSet, StoreError> {
        match self.db.kv_get(FIRED_KEY)? {
            None => Ok(FiredSet::default()),
            Some(json) => match serde_json::from_str(&json) {
                Ok(fired) => Ok(fired),
                Err(e) => {
                    warn!("fired set unreadable, starting empty: {e}");
                    Ok(FiredSet::default())
                }
            },
        }
    }

    pub fn save_fired(&self, fired: &FiredSet) -> Result<(), StoreError> {
        let json = serde_json::to_string(fired)
            .map_err(|e| StoreError::QueryFailed(format!("serialize fired set: {e}")))?;
        self.db.kv_set(FIRED_KEY, &json)
    }
}
