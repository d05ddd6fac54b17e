//! Error types for the store crate

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for store operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The backing store could not be reached or timed out
    #[error("store unavailable: {message}")]
    #[diagnostic(
        code(rendercache::store::unavailable),
        help("Check connectivity to the backing store; the cache layer treats this as a miss on reads")
    )]
    Unavailable {
        /// Description of the connectivity failure
        message: String,
    },

    /// I/O error from a filesystem-backed store
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(rendercache::store::io),
        help("Check file permissions and ensure the store root exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "rename")
        operation: String,
    },

    /// Stored bytes violate the store's own framing
    #[error("corrupt value under key {key}: {message}")]
    #[diagnostic(code(rendercache::store::corrupt))]
    Corrupt {
        /// The key whose value could not be decoded
        key: String,
        /// What was wrong with the stored bytes
        message: String,
    },

    /// Configuration or validation error
    #[error("store configuration error: {message}")]
    #[diagnostic(code(rendercache::store::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create an unavailable error
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a corrupt-value error
    #[must_use]
    pub fn corrupt(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;
