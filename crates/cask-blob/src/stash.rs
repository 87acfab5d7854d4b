use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use cask_store::{ContentStore, StoreError, StoreResult};
use cask_types::{Chunk, Key};
use tracing::trace;

use crate::idpool::IdPool;

/// Private chunk cache in front of a [`ContentStore`].
///
/// Chunks reached through a `Private` key live only here until [`Stash::save`]
/// hands them to the store. A `Private` key is meaningful only to the stash
/// that minted it, and only until that id is saved, dropped or cleared: the
/// id may then be reused for an unrelated chunk.
pub struct Stash {
    store: Arc<dyn ContentStore>,
    ids: IdPool,
    local: HashMap<u64, Chunk>,
}

impl Stash {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            ids: IdPool::new(),
            local: HashMap::new(),
        }
    }

    /// Fetch a chunk, from the stash for `Private` keys and from the store
    /// otherwise.
    pub async fn get(&self, key: &Key, typ: &str, level: u8) -> StoreResult<Cow<'_, Chunk>> {
        if let Some(id) = key.private_id() {
            return self
                .local
                .get(&id)
                .map(Cow::Borrowed)
                .ok_or_else(|| StoreError::not_found(*key, typ, level));
        }
        Ok(Cow::Owned(self.store.get(key, typ, level).await?))
    }

    /// Mutable access to a held private chunk.
    pub fn get_private_mut(&mut self, key: &Key, typ: &str, level: u8) -> StoreResult<&mut Chunk> {
        key.private_id()
            .and_then(|id| self.local.get_mut(&id))
            .ok_or_else(|| StoreError::not_found(*key, typ, level))
    }

    /// Make a chunk private, returning its private key and the mutable chunk.
    ///
    /// An already private key is returned as is. Otherwise the chunk is
    /// fetched and its buffer copied into a fresh one of exactly `size`
    /// bytes, re-inflating any zero-trimmed tail.
    pub async fn clone_chunk(
        &mut self,
        key: &Key,
        typ: &str,
        level: u8,
        size: usize,
    ) -> StoreResult<(Key, &mut Chunk)> {
        if let Some(id) = key.private_id() {
            return match self.local.get_mut(&id) {
                Some(chunk) => Ok((*key, chunk)),
                None => Err(StoreError::not_found(*key, typ, level)),
            };
        }

        let mut chunk = self.store.get(key, typ, level).await?;
        let mut buf = vec![0u8; size];
        let n = chunk.buf.len().min(size);
        buf[..n].copy_from_slice(&chunk.buf[..n]);
        chunk.buf = buf;

        let id = self.ids.get();
        trace!(from = ?key, id, level, "cloned chunk into stash");
        let chunk = match self.local.entry(id) {
            Entry::Vacant(slot) => slot.insert(chunk),
            Entry::Occupied(mut slot) => {
                slot.insert(chunk);
                slot.into_mut()
            }
        };
        Ok((Key::private(id), chunk))
    }

    /// Forget a private chunk. The caller must not reuse the old key.
    pub fn drop_key(&mut self, key: &Key) {
        if let Some(id) = key.private_id() {
            self.release(id);
        }
    }

    /// Persist a private chunk to the store and return its content key.
    ///
    /// The store receives a zero-trimmed copy; the private chunk keeps its
    /// full size until the add succeeds, so a failed or abandoned save leaves
    /// it writable. Non-private keys are already durable and come back
    /// unchanged. On success the private key becomes invalid.
    pub async fn save(&mut self, key: &Key, typ: &str, level: u8) -> StoreResult<Key> {
        let Some(id) = key.private_id() else {
            return Ok(*key);
        };
        let mut trimmed = self
            .local
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(*key, typ, level))?;
        trimmed.trim_zeros();
        let saved = self.store.add(&trimmed).await?;
        trace!(id, level, len = trimmed.len(), key = ?saved, "saved private chunk");
        self.release(id);
        Ok(saved)
    }

    /// Drop every private chunk, e.g. when the blob is rewritten wholesale.
    pub fn clear(&mut self) {
        trace!(dropped = self.local.len(), "cleared stash");
        self.ids = IdPool::new();
        self.local.clear();
    }

    /// Number of private chunks currently held.
    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }

    fn release(&mut self, id: u64) {
        self.ids.put(id);
        self.local.remove(&id);
    }
}

impl std::fmt::Debug for Stash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stash")
            .field("private_chunks", &self.local.len())
            .field("ids_in_use", &self.ids.in_use())
            .finish()
    }
}
