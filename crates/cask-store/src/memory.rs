use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use cask_crypto::hash_chunk;
use cask_types::{Chunk, Key};

use crate::error::StoreResult;
use crate::traits::{handle_get, ContentStore};

type Slot = (Key, String, u8);

/// In-memory, HashMap-based chunk store.
///
/// Intended for tests and embedding. Chunks are held in memory behind a
/// `RwLock` for safe concurrent access, keyed by `(key, type, level)`.
pub struct InMemoryChunkStore {
    chunks: RwLock<HashMap<Slot, Vec<u8>>>,
}

impl InMemoryChunkStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of chunks currently stored.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored chunks.
    pub fn total_bytes(&self) -> u64 {
        self.chunks
            .read()
            .expect("lock poisoned")
            .values()
            .map(|buf| buf.len() as u64)
            .sum()
    }

    fn lookup(&self, key: &Key, typ: &str, level: u8) -> Option<Vec<u8>> {
        let map = self.chunks.read().expect("lock poisoned");
        map.get(&(*key, typ.to_string(), level)).cloned()
    }
}

impl Default for InMemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryChunkStore {
    async fn get(&self, key: &Key, typ: &str, level: u8) -> StoreResult<Chunk> {
        let fetch = move || async move { StoreResult::Ok(self.lookup(key, typ, level)) };
        handle_get(fetch, key, typ, level).await
    }

    async fn add(&self, chunk: &Chunk) -> StoreResult<Key> {
        let key = hash_chunk(chunk);
        if key.is_special() {
            return Ok(key);
        }
        let mut map = self.chunks.write().expect("lock poisoned");
        // Idempotent: content addressing guarantees identical bytes.
        map.entry((key, chunk.typ.clone(), chunk.level))
            .or_insert_with(|| chunk.buf.clone());
        Ok(key)
    }
}

impl std::fmt::Debug for InMemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChunkStore")
            .field("chunk_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_types::KEY_SIZE;

    #[tokio::test]
    async fn add_and_get() {
        let store = InMemoryChunkStore::new();
        let chunk = Chunk::new("type", 0, b"value".to_vec());
        let key = store.add(&chunk).await.unwrap();
        assert!(!key.is_special());

        let back = store.get(&key, "type", 0).await.unwrap();
        assert_eq!(back, chunk);
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let store = InMemoryChunkStore::new();
        let chunk = Chunk::new("type", 0, b"identical".to_vec());
        let k1 = store.add(&chunk).await.unwrap();
        let k2 = store.add(&chunk.clone()).await.unwrap();
        assert_eq!(k1, k2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_chunk_is_not_stored() {
        let store = InMemoryChunkStore::new();
        let key = store.add(&Chunk::empty("type", 2)).await.unwrap();
        assert_eq!(key, Key::EMPTY);
        assert!(store.is_empty());

        let back = store.get(&Key::EMPTY, "type", 2).await.unwrap();
        assert!(back.is_empty());
    }

    #[tokio::test]
    async fn wrong_type_or_level_is_not_found() {
        let store = InMemoryChunkStore::new();
        let key = store
            .add(&Chunk::new("type", 0, b"data".to_vec()))
            .await
            .unwrap();
        assert!(store.get(&key, "other", 0).await.unwrap_err().is_not_found());
        assert!(store.get(&key, "type", 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = InMemoryChunkStore::new();
        let key = Key::from_bytes([3u8; KEY_SIZE]);
        assert!(store.get(&key, "type", 0).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn concurrent_identical_adds_agree() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryChunkStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .add(&Chunk::new("type", 0, b"shared".to_vec()))
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut keys = Vec::new();
        for h in handles {
            keys.push(h.await.unwrap());
        }
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_bytes(), 6);
    }
}
