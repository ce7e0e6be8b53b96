//! Custom error types for docsaver
//!
//! This module defines the error hierarchy for the saver, the record stores
//! and the command-line tool using thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for docsaver operations
#[derive(Error, Debug)]
pub enum SaverError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors raised by setters or the finalize hook
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The store rejected a write that did not reference the current revision
    #[error("Write conflict on record {id}: expected revision {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: String,
        actual: String,
    },

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    Password(String),

    /// The store cannot perform the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SaverError {
    /// Create a "not found" error for records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Record",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for users
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for attachments
    pub fn attachment_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Attachment",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a write conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<std::io::Error> for SaverError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SaverError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for docsaver operations
pub type SaverResult<T> = Result<T, SaverError>;
