use serde::{Deserialize, Serialize};

use crate::error::{BlobError, BlobResult};

/// Smallest accepted leaf chunk size, in bytes.
pub const MIN_CHUNK_SIZE: u32 = 4096;

/// Tuning parameters for new blobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Maximum raw bytes per leaf chunk (default: 4 MiB).
    pub chunk_size: u32,
    /// Children per pointer chunk (default: 64).
    pub fanout: u32,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4 * 1024 * 1024,
            fanout: 64,
        }
    }
}

impl BlobConfig {
    pub fn validate(&self) -> BlobResult<()> {
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
}
