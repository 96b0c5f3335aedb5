//! Core error types for medalroom-core.
//!
//! This module defines the error hierarchy using thiserror. Pure computations
//! (evaluation, interpolation) only fail on invalid input; everything touching
//! the store surfaces a [`DatabaseError`].

use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};
use thiserror::Error;

/// Core error type for medalroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No day type is mapped to the weekday of the requested date.
    ///
    /// Batch callers treat this as a skip, not a failure.
    #[error("No day type configured for {date} ({weekday})")]
    ConfigurationMissing { date: NaiveDate, weekday: Weekday },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Import-related errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// A single date inside a batch failed; the batch was aborted.
    #[error("Failed to reconcile {date}: {source}")]
    DateFailed {
        date: NaiveDate,
        #[source]
        source: Box<CoreError>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Wrap this error with the date being processed when it occurred.
    pub fn for_date(self, date: NaiveDate) -> Self {
        match self {
            already @ CoreError::DateFailed { .. } => already,
            other => CoreError::DateFailed {
                date,
                source: Box::new(other),
            },
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored data could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid date range
    #[error("Invalid date range: end ({end}) must be on or after start ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Malformed date string
    #[error("Invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Malformed time-of-day string
    #[error("Invalid time '{input}': expected HH:MM")]
    InvalidTime { input: String },

    /// Negative amount where only non-negative values make sense
    #[error("Negative value for '{field}': {value}")]
    Negative { field: String, value: i64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Import-specific errors.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Unknown source format name
    #[error("Unknown import source '{0}': expected spexport or spbackup")]
    UnknownSource(String),

    /// The payload could not be decoded
    #[error("Failed to decode {source_name} payload: {message}")]
    Decode { source_name: String, message: String },

    /// No candidate file was found for an automatic import
    #[error("No JSON files found in {0}")]
    NoCandidates(PathBuf),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
