// ABOUTME: Error types for persistence backends and typed store operations.
// ABOUTME: Backend failures are wrapped into store errors so CRUD callers see one error type.

use thiserror::Error;

/// Errors raised by a persistence backend while reading or writing a slot.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("read failed for {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("write failed for {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// Errors surfaced by typed store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching {context} with key: {key}")]
    NotFound { context: String, key: String },

    #[error("restore will override already set {context}")]
    RestoreConflict { context: String },

    #[error("{context} key {key} does not match record identifier {actual}")]
    KeyMismatch {
        context: String,
        key: String,
        actual: String,
    },

    #[error("update for {context} must be a JSON object")]
    InvalidPatch { context: String },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
