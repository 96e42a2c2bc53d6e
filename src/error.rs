//! Error types for corkboard operations.

use thiserror::Error;

/// Result type alias for corkboard operations.
pub type Result<T> = std::result::Result<T, CorkboardError>;

/// Main error type for corkboard operations.
///
/// Authorization denials are not errors: service operations report them as a
/// plain `false` result, matching the wire protocol's boolean replies.
#[derive(Error, Debug)]
pub enum CorkboardError {
    /// Malformed or invalid client input (bad action format, unknown
    /// resource or verb, missing or wrongly typed body field).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Entity absent for a singular fetch.
    #[error("{0}")]
    NotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unexpected internal failures
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CorkboardError {
    /// Creates a new invalid request error.
    pub fn invalid_request<T: ToString>(msg: T) -> Self {
        Self::InvalidRequest(msg.to_string())
    }

    /// Creates a new not found error.
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new storage error.
    pub fn storage<T: ToString>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a new internal error.
    pub fn internal<T: ToString>(msg: T) -> Self {
        Self::Internal(msg.to_string())
    }
}
