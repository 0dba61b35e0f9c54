//! Error types.

use thiserror::Error;

/// Errors surfaced to callers building a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Parameters must serialize to a JSON object.
    #[error("transaction parameters must be a key-value mapping, got {0}")]
    InvalidParams(String),
}

/// Failures talking to the remote transaction ID service.
///
/// These never reach callers; the identifier source logs them and falls back
/// to local generation.
#[derive(Debug, Error)]
pub enum IdServiceError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("unreadable response body: {0}")]
    Body(String),

    #[error("response carried no usable transaction id")]
    EmptyIdentifier,
}
