//! Error types for convlog
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for convlog operations
///
/// Covers configuration problems, invalid caller input, storage failures,
/// malformed files on disk, and lock contention.
#[derive(Error, Debug)]
pub enum ConvlogError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid session id, role, or message content
    #[error("Validation error: {0}")]
    Validation(String),

    /// A requested session does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A file could not be read or written
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path of the file or directory involved
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// An existing file is not valid JSON of the expected shape
    #[error("Parse error in {}: {source}", path.display())]
    Parse {
        /// Path of the malformed file
        path: PathBuf,
        /// Underlying JSON failure
        #[source]
        source: serde_json::Error,
    },

    /// The store lock could not be acquired in time
    #[error("Lock error: {0}")]
    Lock(String),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConvlogError {
    /// Build an `Io` error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a `Parse` error for `path`
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Process exit code reported for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::NotFound(_) => 2,
            Self::Io { .. } => 3,
            Self::Parse { .. } => 4,
            Self::Lock(_) => 5,
            Self::Serialization(_) | Self::Yaml(_) => 1,
        }
    }
}

/// Result type alias for convlog operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Map an error chain to a process exit code.
///
/// The first `ConvlogError` found in the chain decides the code. Bare IO
/// errors map to the `Io` code; anything else exits with 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ConvlogError>() {
            return e.exit_code();
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return 3;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_config_error_display() {
        let error = ConvlogError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_validation_error_display() {
        let error = ConvlogError::Validation("content must not be empty".to_string());
        assert_eq!(
            error.to_string(),
            "Validation error: content must not be empty"
        );
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ConvlogError::io("/tmp/x/index.json", io);
        let s = error.to_string();
        assert!(s.contains("/tmp/x/index.json"));
        assert!(s.contains("denied"));
    }

    #[test]
    fn test_parse_error_display_includes_path() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let error = ConvlogError::parse("sessions/a.json", json_error);
        assert!(error.to_string().starts_with("Parse error in sessions/a.json"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: ConvlogError = json_error.into();
        assert!(matches!(error, ConvlogError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: ConvlogError = yaml_error.into();
        assert!(matches!(error, ConvlogError::Yaml(_)));
    }

    #[test]
    fn test_exit_codes_per_variant() {
        assert_eq!(ConvlogError::Config("x".into()).exit_code(), 2);
        assert_eq!(ConvlogError::Validation("x".into()).exit_code(), 2);
        assert_eq!(ConvlogError::NotFound("x".into()).exit_code(), 2);
        assert_eq!(ConvlogError::Lock("x".into()).exit_code(), 5);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(ConvlogError::io("a", io).exit_code(), 3);
    }

    #[test]
    fn test_exit_code_for_finds_error_under_context() {
        let json_error = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let result: std::result::Result<(), ConvlogError> =
            Err(ConvlogError::parse("index.json", json_error));
        let err = result.context("Failed to update index").unwrap_err();
        assert_eq!(exit_code_for(&err), 4);
    }

    #[test]
    fn test_exit_code_for_bare_io_error() {
        let err = anyhow::Error::new(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert_eq!(exit_code_for(&err), 3);
    }

    #[test]
    fn test_exit_code_for_unknown_error() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConvlogError>();
    }
}
