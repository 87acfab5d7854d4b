use cask_types::Key;

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested chunk was not found.
    #[error("not found: {typ:?}@{level} {key}")]
    NotFound { typ: String, level: u8, key: Key },

    /// Failure in the byte store underneath.
    #[error("backend error: {0}")]
    Backend(#[from] cask_kv::KvError),
}

impl StoreError {
    pub fn not_found(key: Key, typ: &str, level: u8) -> Self {
        Self::NotFound {
            typ: typ.to_string(),
            level,
            key,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
