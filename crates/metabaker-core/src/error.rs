//! Error types for Metabaker
//!
//! Every failure aborts the running task. Nothing is recovered locally
//! except per-token download failures, which are collected into the report.

use std::path::PathBuf;

/// Main Metabaker error type
#[derive(Debug, thiserror::Error)]
pub enum MetabakerError {
    /// Bad or zero count, missing address, missing storage credential
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Expected per-index metadata or image is absent
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// A per-index record exists but does not have the expected shape
    #[error("malformed record {path}: {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    /// Chain read or storage call failed
    #[error("external call failed: {0}")]
    ExternalCallFailure(String),

    /// Filesystem error
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("invalid json at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl MetabakerError {
    /// Create invalid argument error
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create missing record error
    #[inline]
    pub fn missing_record(message: impl Into<String>) -> Self {
        Self::MissingRecord(message.into())
    }

    /// Create external call error
    #[inline]
    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalCallFailure(message.into())
    }

    /// Create IO error for path
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create JSON error for path
    #[inline]
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Check if error was raised by argument validation
    #[inline]
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if error reports an absent record
    #[inline]
    #[must_use]
    pub fn is_missing_record(&self) -> bool {
        matches!(self, Self::MissingRecord(_))
    }

    /// Check if error came from a collaborator call
    #[inline]
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalCallFailure(_))
    }
}

/// Result alias used across the workspace
pub type Result<T, E = MetabakerError> = std::result::Result<T, E>;
