//! Error types for the cache crate

use miette::Diagnostic;
use thiserror::Error;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The brief content could not be canonicalized for hashing
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(rendercache::serialization),
        help("The brief must be encodable as JSON (string map keys, no exotic types)")
    )]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },

    /// Configuration or validation error
    #[error("Cache configuration error: {message}")]
    #[diagnostic(code(rendercache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// The backing store failed
    #[error("Cache store operation failed")]
    #[diagnostic(code(rendercache::store))]
    Store {
        /// The underlying store error
        #[from]
        source: rendercache_store::Error,
    },
}

impl Error {
    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
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

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
