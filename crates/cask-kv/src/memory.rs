use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{KvError, KvResult};
use crate::traits::ByteStore;

/// In-memory, HashMap-based byte store.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemoryByteStore {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryByteStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.data.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryByteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ByteStore for InMemoryByteStore {
    async fn get(&self, key: &[u8]) -> KvResult<Vec<u8>> {
        let map = self.data.read().expect("lock poisoned");
        map.get(key)
            .cloned()
            .ok_or_else(|| KvError::NotFound(key.to_vec()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        let mut map = self.data.write().expect("lock poisoned");
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryByteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryByteStore")
            .field("value_count", &self.len())
            .finish()
    }
}
