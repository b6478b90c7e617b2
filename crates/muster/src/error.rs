//! Error types for muster.
//!
//! This module defines all error types used throughout the muster crate.
//! Request outcomes (`NotAuthorized`, `Validation`) are expected and go back
//! to the caller as-is; storage failures are surfaced as `BackendUnavailable`.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for muster operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Request Errors ===
    /// The submitted identifier is not on the roster.
    #[error("not authorized: '{id}' is not in the directory")]
    NotAuthorized {
        /// The identifier as submitted.
        id: String,
    },

    /// A required submission field is missing or malformed.
    #[error("invalid request: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

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

    /// The check-in store could not complete an operation.
    #[error("check-in store unavailable: {0}")]
    BackendUnavailable(String),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Directory Source Errors ===
    /// A roster or membership export could not be read or parsed.
    #[error("malformed directory source {path}: {message}")]
    MalformedSource {
        /// Path to the export file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
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
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for muster operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
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

    /// Create a new backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Create a not-authorized error for the given identifier.
    #[must_use]
    pub fn not_authorized(id: impl Into<String>) -> Self {
        Self::NotAuthorized { id: id.into() }
    }

    /// Create a malformed source error.
    #[must_use]
    pub fn malformed_source(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedSource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a roster-membership rejection.
    #[must_use]
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::NotAuthorized { .. })
    }

    /// Check if this error is a request validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from the check-in store.
    #[must_use]
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::DatabaseOpen { .. } | Self::DatabaseMigration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authorized_display() {
        let err = Error::not_authorized("zz9zz");
        assert_eq!(
            err.to_string(),
            "not authorized: 'zz9zz' is not in the directory"
        );
        assert!(err.is_not_authorized());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_error() {
        let err = Error::validation("location is required");
        assert_eq!(err.to_string(), "invalid request: location is required");
        assert!(err.is_validation());
        assert!(!err.is_backend_unavailable());
    }

    #[test]
    fn test_backend_error() {
        let err = Error::backend("connection reset");
        assert_eq!(
            err.to_string(),
            "check-in store unavailable: connection reset"
        );
        assert!(err.is_backend_unavailable());
    }

    #[test]
    fn test_from_rusqlite_error_is_backend() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(err.is_backend_unavailable());
        }
    }

    #[test]
    fn test_malformed_source_display() {
        let err = Error::malformed_source("/data/roster.csv", "unterminated quote");
        let msg = err.to_string();
        assert!(msg.contains("/data/roster.csv"));
        assert!(msg.contains("unterminated quote"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_counts_as_backend() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
        assert!(err.is_backend_unavailable());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "list_key must not be empty".to_string(),
        };
        assert!(err.to_string().contains("list_key"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
