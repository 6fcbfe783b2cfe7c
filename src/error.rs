//! Error types for recdb
//!
//! Provides a unified error type for all operations. Expected outcomes such as
//! a missing key or a full hash table are not errors; they are reported through
//! `Option` / [`Lookup`](crate::storage::Lookup) values.

use thiserror::Error;

/// Result type alias using RecError
pub type Result<T> = std::result::Result<T, RecError>;

/// Unified error type for recdb operations
#[derive(Debug, Error)]
pub enum RecError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Invalid block offset {offset}: {reason}")]
    InvalidOffset { offset: u64, reason: String },

    #[error("Invalid index metadata: {0}")]
    Metadata(String),

    #[error("Corrupted block: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Record codec error: {0}")]
    Codec(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for RecError {
    fn from(err: bincode::Error) -> Self {
        RecError::Serialization(err.to_string())
    }
}
