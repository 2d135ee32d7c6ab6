//! Custom error types for dbdump
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for dbdump operations
#[derive(Error, Debug)]
pub enum DbdumpError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(String),

    /// No converter is registered for a database engine
    #[error("Backend not found for engine: {0}")]
    BackendNotFound(String),

    /// Command template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// A process could not be started
    #[error("Failed to run `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    /// The dump process exited with a non-zero status
    #[error("Dump command failed with exit code {code}: {command}")]
    DumpCommandFailed { command: String, code: i32 },

    /// The compression process exited with a non-zero status
    #[error("Compress command failed with exit code {code}: {command}")]
    CompressCommandFailed { command: String, code: i32 },

    /// rsync did not show a prompt in time
    #[error("Timed out waiting for rsync prompt: {command}")]
    SyncTimeout { command: String },

    /// The remote rejected the configured password
    #[error("rsync authentication failed: permission denied")]
    SyncAuthFailed,

    /// rsync exited with a non-zero status
    #[error("rsync exited with code {code}")]
    SyncFailed { code: i32 },
}

impl DbdumpError {
    /// Create a spawn error from any displayable reason
    pub fn spawn(command: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Spawn {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error came from the sync step
    pub fn is_sync(&self) -> bool {
        matches!(
            self,
            Self::SyncTimeout { .. } | Self::SyncAuthFailed | Self::SyncFailed { .. }
        )
    }

    /// Check if this error came from an external dump or compress process
    pub fn is_command_failure(&self) -> bool {
        matches!(
            self,
            Self::DumpCommandFailed { .. } | Self::CompressCommandFailed { .. }
        )
    }
}

impl From<std::io::Error> for DbdumpError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DbdumpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for DbdumpError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err.to_string())
    }
}

/// Result type alias for dbdump operations
pub type DbdumpResult<T> = Result<T, DbdumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbdumpError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_backend_not_found_names_engine() {
        let err = DbdumpError::BackendNotFound("django.db.backends.mysql".into());
        assert_eq!(
            err.to_string(),
            "Backend not found for engine: django.db.backends.mysql"
        );
    }

    #[test]
    fn test_dump_failure_display() {
        let err = DbdumpError::DumpCommandFailed {
            command: "pg_dump x".into(),
            code: 2,
        };
        assert_eq!(
            err.to_string(),
            "Dump command failed with exit code 2: pg_dump x"
        );
        assert!(err.is_command_failure());
        assert!(!err.is_sync());
    }

    #[test]
    fn test_sync_classification() {
        assert!(DbdumpError::SyncAuthFailed.is_sync());
        assert!(DbdumpError::SyncFailed { code: 23 }.is_sync());
        assert!(DbdumpError::SyncTimeout {
            command: "rsync".into()
        }
        .is_sync());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DbdumpError = io_err.into();
        assert!(matches!(err, DbdumpError::Io(_)));
    }
}
