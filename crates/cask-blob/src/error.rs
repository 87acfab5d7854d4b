use cask_store::StoreError;
use cask_types::Key;
use thiserror::Error;

/// Errors from blob operations.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("manifest is missing type")]
    MissingType,

    #[error("chunk size is too small: {given} < {min}")]
    SmallChunkSize { given: u32, min: u32 },

    #[error("fanout is too small: {given}")]
    SmallFanout { given: u32 },

    /// A pointer slot holds a reserved key pattern: the tree is corrupt.
    #[error("invalid stored key: slot {slot} of {parent:?} at level {level}")]
    Corrupt { parent: Key, slot: usize, level: u8 },

    #[error("negative offset is not possible: {0}")]
    NegativeOffset(i64),

    #[error("blob size would exceed {max} bytes")]
    SizeOverflow { max: u64 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BlobError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

pub type BlobResult<T> = Result<T, BlobError>;
