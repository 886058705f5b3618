//! Error types for PartnerScout.
//!
//! Library crates use [`PartnerScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PartnerScout operations.
#[derive(Debug, thiserror::Error)]
pub enum PartnerScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// An external provider (search, analysis oracle, profile enrichment)
    /// is unreachable or rejected the request.
    #[error("provider error: {0}")]
    Provider(String),

    /// Response parsing error (malformed provider payload).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or persistent-store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (empty query, invalid parameter, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PartnerScoutError>;

impl PartnerScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PartnerScoutError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = PartnerScoutError::validation("query must not be empty");
        assert!(err.to_string().contains("query must not be empty"));
    }
}
