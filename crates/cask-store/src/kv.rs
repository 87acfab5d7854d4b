use std::sync::Arc;

use async_trait::async_trait;
use cask_crypto::hash_chunk;
use cask_kv::{ByteStore, KvError};
use cask_types::{Chunk, Key, KEY_SIZE};
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::traits::{handle_get, ContentStore};

/// Backend key for a chunk: `key ‖ type ‖ level`.
///
/// This layout is committed: stores written by one version must be readable
/// by the next.
pub fn composite_key(key: &Key, typ: &str, level: u8) -> Vec<u8> {
    let mut k = Vec::with_capacity(KEY_SIZE + typ.len() + 1);
    k.extend_from_slice(key.as_bytes());
    k.extend_from_slice(typ.as_bytes());
    k.push(level);
    k
}

/// Chunk store over an opaque byte store.
pub struct KvChunkStore {
    kv: Arc<dyn ByteStore>,
}

impl KvChunkStore {
    pub fn new(kv: Arc<dyn ByteStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl ContentStore for KvChunkStore {
    async fn get(&self, key: &Key, typ: &str, level: u8) -> StoreResult<Chunk> {
        let fetch = move || async move {
            match self.kv.get(&composite_key(key, typ, level)).await {
                Ok(data) => Ok(Some(data)),
                Err(KvError::NotFound(_)) => Ok(None),
                Err(e) => Err(StoreError::from(e)),
            }
        };
        handle_get(fetch, key, typ, level).await
    }

    async fn add(&self, chunk: &Chunk) -> StoreResult<Key> {
        let key = hash_chunk(chunk);
        if key.is_special() {
            return Ok(key);
        }
        self.kv
            .put(&composite_key(&key, &chunk.typ, chunk.level), &chunk.buf)
            .await?;
        trace!(key = %key.short_hex(), typ = %chunk.typ, level = chunk.level, len = chunk.buf.len(), "added chunk");
        Ok(key)
    }
}

impl std::fmt::Debug for KvChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvChunkStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_kv::{FileByteStore, InMemoryByteStore};

    #[test]
    fn composite_key_layout() {
        let key = Key::from_bytes([9u8; KEY_SIZE]);
        let k = composite_key(&key, "blob", 3);
        assert_eq!(k.len(), KEY_SIZE + 4 + 1);
        assert_eq!(&k[..KEY_SIZE], key.as_bytes());
        assert_eq!(&k[KEY_SIZE..KEY_SIZE + 4], b"blob");
        assert_eq!(k[KEY_SIZE + 4], 3);
    }

    #[tokio::test]
    async fn add_and_get_through_kv() {
        let kv = Arc::new(InMemoryByteStore::new());
        let store = KvChunkStore::new(kv.clone());
        let chunk = Chunk::new("type", 0, b"value".to_vec());
        let key = store.add(&chunk).await.unwrap();

        let back = store.get(&key, "type", 0).await.unwrap();
        assert_eq!(back.buf, b"value");

        // stored under the composite key
        let raw = kv.get(&composite_key(&key, "type", 0)).await.unwrap();
        assert_eq!(raw, b"value");
    }

    #[tokio::test]
    async fn empty_chunk_skips_backend() {
        let kv = Arc::new(InMemoryByteStore::new());
        let store = KvChunkStore::new(kv.clone());
        let key = store.add(&Chunk::empty("type", 0)).await.unwrap();
        assert_eq!(key, Key::EMPTY);
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn missing_is_not_found() {
        let store = KvChunkStore::new(Arc::new(InMemoryByteStore::new()));
        let key = Key::from_bytes([1u8; KEY_SIZE]);
        assert!(store.get(&key, "type", 0).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn file_backed_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(FileByteStore::open(dir.path()).unwrap());
        let store = KvChunkStore::new(kv);
        let chunk = Chunk::new("type", 1, vec![1, 2, 3]);
        let k1 = store.add(&chunk).await.unwrap();
        let k2 = store.add(&chunk).await.unwrap();
        assert_eq!(k1, k2);
        assert_eq!(store.get(&k1, "type", 1).await.unwrap(), chunk);
    }
}
