//! Core error types for moments-core.
//!
//! This module defines the error hierarchy using thiserror. Persistence,
//! configuration and validation each get their own enum, folded into
//! [`CoreError`] at the library boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for moments-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store / persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another writer
    #[error("Database is locked")]
    Locked,

    /// Failed to access the data directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Alarm validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Alarm name must not be empty
    #[error("Alarm name must not be empty")]
    EmptyName,

    /// Coordinates outside valid degree ranges
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Radius must be strictly positive
    #[error("Invalid radius: {0} m (must be > 0)")]
    InvalidRadius(f64),

    /// Time-based alarm without a time-of-day value
    #[error("Time-based alarm '{0}' has no time of day")]
    MissingTime(String),

    /// Alarm id already present in the store
    #[error("Alarm id '{0}' already exists")]
    DuplicateId(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
