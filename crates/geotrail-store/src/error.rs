//! Error types for geotrail-store.

use std::path::PathBuf;

use geotrail_types::ParseError;

/// Result type for geotrail-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in geotrail-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored timestamp cannot be represented.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A stored value failed to parse back into the data model.
    #[error("Corrupt stored data: {0}")]
    InvalidData(#[from] ParseError),
}
