//! Error types for the sync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the sync system
#[derive(Error, Debug)]
pub enum Error {
    /// Node source-related errors
    #[error("node source error: {0}")]
    NodeSource(String),

    /// DNS record store-related errors
    #[error("record store error ({store}): {message}")]
    Store {
        /// Store name
        store: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Record or zone not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Authentication errors
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// HTTP client errors (from store or cluster APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// One or more address families failed to reconcile while the others
    /// were still attempted
    #[error("cycle partially failed for record type(s): {families}")]
    PartialCycle {
        /// Comma-separated record types with their failure messages
        families: String,
    },

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a node source error
    pub fn node_source(msg: impl Into<String>) -> Self {
        Self::NodeSource(msg.into())
    }

    /// Create a record store error
    pub fn store(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a partial-cycle error from per-family failure descriptions
    pub fn partial_cycle(families: impl Into<String>) -> Self {
        Self::PartialCycle {
            families: families.into(),
        }
    }

    /// Whether this error is a "not found" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
