//! Custom error types for LedgerCLI
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for LedgerCLI operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
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

    /// Stored data that cannot be represented in the target backend
    #[error("Integrity error in transaction {id}: {reason}")]
    Integrity { id: String, reason: String },

    /// Storage errors (flat-file backend and façade)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Relational backend errors
    #[error("Database error: {0}")]
    Database(String),

    /// Encryption errors other than authentication failures
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Wrong password, tampered or truncated ciphertext.
    #[error("Authentication failed: wrong password or corrupted data")]
    Authentication,
}

impl LedgerError {
    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "duplicate" error for transaction identifiers
    pub fn duplicate_transaction(identifier: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create an integrity error for a given transaction
    pub fn integrity(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Integrity {
            id: id.into(),
            reason: reason.into(),
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

    /// Errors the caller should answer by asking for the password again
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for LedgerCLI operations
pub type LedgerResult<T> = Result<T, LedgerError>;
