//! Error types for rollbook.
//!
//! Structural failures (unreadable or corrupt backing files, bad configuration)
//! are reported through [`Error`]. Logical misses such as updating an id that
//! does not exist are not errors; the store reports them as `false`.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rollbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// The backing file exists but does not hold a well-formed record map.
    #[error("corrupt data in {path}: {source}")]
    CorruptData {
        /// Path to the backing file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to read the backing file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path to the backing file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the backing file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path to the backing file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
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

    // === Validation Errors ===
    /// Caller-supplied record fields were rejected.
    #[error("invalid record: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
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
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for rollbook operations.
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

    /// Create a corrupt data error for the given backing file.
    #[must_use]
    pub fn corrupt_data(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::CorruptData {
            path: path.into(),
            source,
        }
    }

    /// Check if this error means the backing file could not be parsed.
    #[must_use]
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }

    /// Check if this error is a rejected record.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
