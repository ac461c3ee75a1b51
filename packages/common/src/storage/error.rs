use thiserror::Error;

/// Errors returned by blob store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob exists for the given content hash.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The blob exceeds the configured size limit.
    #[error("blob size {actual} exceeds limit {limit}")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    /// The given string is not a valid hex-encoded SHA-256 hash.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
