//! Store and publish error types.

/// Errors that can occur while resolving or publishing content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nothing is bound to the reference.
    #[error("{reference}: not found")]
    NotFound { reference: String },

    /// The store could not be reached or refused the request.
    #[error("store request failed: {detail}")]
    Transport { detail: String },

    /// Malformed reference, digest or descriptor.
    #[error("invalid input: {detail}")]
    InvalidInput { detail: String },

    /// Pushed bytes do not hash to the descriptor's digest.
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    /// Pushed bytes do not match the descriptor's size.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::InvalidInput`] from anything printable.
    pub fn invalid(detail: impl Into<String>) -> Self {
        Error::InvalidInput {
            detail: detail.into(),
        }
    }

    /// Whether this error only reports that a reference is unbound.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
