use cask_types::Key;
use serde::{Deserialize, Serialize};

use crate::config::{BlobConfig, MIN_CHUNK_SIZE};
use crate::error::{BlobError, BlobResult};

/// Durable description of one blob's committed state.
///
/// A manifest with an `Empty` root is a valid, zero-filled blob of `size`
/// bytes; every field must still hold valid tuning values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "type")]
    pub typ: String,
    pub root: Key,
    pub size: u64,
    /// Must be >= [`MIN_CHUNK_SIZE`].
    pub chunk_size: u32,
    /// Must be >= 2.
    pub fanout: u32,
}

impl Manifest {
    /// An empty manifest of the given type with the default tuning parameters.
    pub fn empty(typ: impl Into<String>) -> Self {
        Self::with_config(typ, &BlobConfig::default())
    }

    /// An empty manifest of the given type with explicit tuning parameters.
    pub fn with_config(typ: impl Into<String>, config: &BlobConfig) -> Self {
        Self {
            typ: typ.into(),
            root: Key::EMPTY,
            size: 0,
            chunk_size: config.chunk_size,
            fanout: config.fanout,
        }
    }

    /// Check the fields [`Blob::open`](crate::Blob::open) relies on.
    pub fn validate(&self) -> BlobResult<()> {
        if self.typ.is_empty() {
            return Err(BlobError::MissingType);
        }
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(BlobError::SmallChunkSize {
                given: self.chunk_size,
                min: MIN_CHUNK_SIZE,
            });
        }
        if self.fanout < 2 {
            return Err(BlobError::SmallFanout { given: self.fanout });
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> BlobResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BlobError::Serialization(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> BlobResult<Self> {
        bincode::deserialize(data).map_err(|e| BlobError::Serialization(e.to_string()))
    }
}
