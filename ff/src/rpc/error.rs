//! RPC error types

use thiserror::Error;

/// Errors that can occur while reading contract state over JSON-RPC
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Check if an HTTP status code is worth retrying
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

impl ReadError {
    /// Check if this error is retryable
    ///
    /// RPC error objects (e.g. execution reverted) are final: the node
    /// answered, and asking again yields the same answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReadError::Network(_) => true,
            ReadError::Status { status, .. } => is_retryable_status(*status),
            ReadError::Rpc { .. } => false,
            ReadError::InvalidResponse(_) => false,
            ReadError::Json(_) => false,
        }
    }
}
