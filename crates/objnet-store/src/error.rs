use objnet_types::{ObjectId, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// A dependency lookup was not satisfied within the find timeout.
    #[error("timed out waiting for object {0}")]
    ResolutionTimeout(ObjectId),

    /// The object could not be canonically encoded for hashing.
    #[error("encoding error: {0}")]
    Encoding(#[from] TypeError),

    /// Stored bytes could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: stored content hashes to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// `NotFound` and `ResolutionTimeout` are expected outcomes, not faults.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::ResolutionTimeout(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
