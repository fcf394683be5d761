//! Error types for listkeep
//!
//! Provides structured error types with context for better debugging
//! and user-friendly error messages.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationError;

/// The main error type for listkeep operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Input Errors
    // ==========================================================================
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ==========================================================================
    // Lookup Errors
    // ==========================================================================
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} '{id}' has not been saved yet")]
    NotPersisted { entity: &'static str, id: String },

    // ==========================================================================
    // Persistence Errors
    // ==========================================================================
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to prepare database directory '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },

    #[error("Background task failed: {message}")]
    Join { message: String },

    // ==========================================================================
    // Serialization Errors
    // ==========================================================================
    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("Invalid timestamp '{value}'")]
    Timestamp { value: String },

    // ==========================================================================
    // Catch-all
    // ==========================================================================
    #[error("{0}")]
    Other(String),
}

/// Result type alias for listkeep operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Join {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Error Display Helpers
// =============================================================================

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns a user-friendly suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Validation(ValidationError::Empty) => Some("Type something first"),
            Error::Validation(ValidationError::InvalidTag(..)) => {
                Some("Tags may only use letters, numbers, underscores, and hyphens")
            }
            Error::NotFound { .. } => Some("The record was removed; refresh the list"),
            Error::UnsupportedSchemaVersion { .. } => {
                Some("The database was written by a newer version of listkeep")
            }
            _ => None,
        }
    }

    /// True for failures coming from the executor or a transaction
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Sqlite(_)
                | Error::Io { .. }
                | Error::UnsupportedSchemaVersion { .. }
                | Error::Join { .. }
                | Error::Serialization { .. }
                | Error::Timestamp { .. }
        )
    }
}

// =============================================================================
// Store errors
// =============================================================================

/// What a store was doing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Load,
    Write,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Load => f.write_str("load"),
            ActionKind::Write => f.write_str("write"),
        }
    }
}

/// Error recorded in a store's state after a rollback
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} failed: {message}")]
pub struct StoreError {
    pub kind: ActionKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: ActionKind, err: &Error) -> Self {
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("item", 42);
        assert_eq!(err.to_string(), "item '42' not found");
    }

    #[test]
    fn test_error_suggestion() {
        let err = Error::from(ValidationError::Empty);
        assert!(err.suggestion().is_some());
        assert!(!err.is_persistence());
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::new(ActionKind::Write, &Error::Other("disk full".into()));
        assert_eq!(err.to_string(), "write failed: disk full");
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::Io {
            path: "/data".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_persistence());
        assert_eq!(err.source().unwrap().to_string(), "denied");
    }

    #[test]
    fn test_sqlite_is_persistence() {
        let err = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_persistence());
    }
}
