//! Error types for finanscan.
//!
//! This module defines all error types used throughout the finanscan crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for finanscan operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// No transaction exists with the given id.
    #[error("transaction {id} not found")]
    TransactionNotFound {
        /// The id that was looked up.
        id: i64,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Transaction Errors ===
    /// A transaction or draft failed validation.
    #[error("invalid transaction: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// An amount could not be parsed.
    #[error("invalid amount '{input}'")]
    InvalidAmount {
        /// The text that failed to parse.
        input: String,
    },

    /// A date could not be parsed.
    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate {
        /// The text that failed to parse.
        input: String,
    },

    // === Extraction Errors ===
    /// The receipt file cannot be sent for extraction.
    #[error("unsupported receipt file {path}: {reason}")]
    UnsupportedReceipt {
        /// Path to the rejected file.
        path: PathBuf,
        /// Why the file was rejected.
        reason: String,
    },

    /// The extraction service failed or returned garbage.
    #[error("failed to extract data from file: {message}")]
    Extraction {
        /// Description of what went wrong.
        message: String,
    },

    /// No extractor is configured.
    #[error("no extraction command configured; set extraction.command or pass --data")]
    ExtractorNotConfigured,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for finanscan operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new extraction error.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create an unsupported receipt error.
    #[must_use]
    pub fn unsupported_receipt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnsupportedReceipt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means a transaction id did not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TransactionNotFound { .. })
    }

    /// Check if this error is a user-input validation problem.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvalidAmount { .. } | Self::InvalidDate { .. }
        )
    }
}
