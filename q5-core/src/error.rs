/// Structured error types for q5-core.
///
/// Binary crates (q5-cli) wrap these in `anyhow` for convenience,
/// library consumers get structured, composable errors.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for q5-core operations
#[derive(Error, Debug)]
pub enum Q5Error {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// A self-reported badge signal is outside the 0..=4 scale
    #[error("{signal} must be between 0 and {max}, got {value}")]
    SignalOutOfRange {
        signal: &'static str,
        value: u8,
        max: u8,
    },

    /// Config file could not be parsed
    #[error("Invalid config file {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// Config file missing at an explicitly requested path
    #[error("Config not found at {path:?}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for q5-core operations
pub type Result<T> = std::result::Result<T, Q5Error>;

impl Q5Error {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a config parse error
    pub fn config_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Q5Error::SignalOutOfRange {
            signal: "impact",
            value: 7,
            max: 4,
        };
        assert_eq!(err.to_string(), "impact must be between 0 and 4, got 7");

        let err = Q5Error::config_parse("/tmp/config.toml", "expected table");
        assert!(err.to_string().contains("Invalid config file"));
        assert!(err.to_string().contains("/tmp/config.toml"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: Q5Error = io_err.into();

        assert!(matches!(err, Q5Error::Io { .. }));
    }
}
