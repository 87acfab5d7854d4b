/// Errors from byte store operations.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// No value is stored under the key.
    #[error("not found: {}", hex::encode(.0))]
    NotFound(Vec<u8>),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KvError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for byte store operations.
pub type KvResult<T> = Result<T, KvError>;
