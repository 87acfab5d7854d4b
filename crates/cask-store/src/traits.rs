use std::future::Future;

use async_trait::async_trait;
use cask_types::{Chunk, Key};

use crate::error::{StoreError, StoreResult};

/// Content-addressed chunk store.
///
/// All implementations must satisfy these invariants:
/// - `get` of [`Key::EMPTY`] returns a zero-length chunk without a backend
///   lookup; any other special key is not found.
/// - `add` hashes the chunk; an empty chunk is never written and yields
///   [`Key::EMPTY`].
/// - `add` is idempotent and safe under concurrent identical writes.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a chunk by key, type and level.
    async fn get(&self, key: &Key, typ: &str, level: u8) -> StoreResult<Chunk>;

    /// Write a chunk and return its content key.
    async fn add(&self, chunk: &Chunk) -> StoreResult<Key>;
}

/// Shared `get` logic for backends.
///
/// Resolves the special keys and turns a `None` from `fetch` into
/// [`StoreError::NotFound`]; `fetch` is only called for content keys.
pub async fn handle_get<F, Fut>(fetch: F, key: &Key, typ: &str, level: u8) -> StoreResult<Chunk>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = StoreResult<Option<Vec<u8>>>>,
{
    if key.is_special() {
        if key.is_empty() {
            return Ok(Chunk::empty(typ, level));
        }
        return Err(StoreError::not_found(*key, typ, level));
    }

    match fetch().await? {
        Some(data) => Ok(Chunk::new(typ, level, data)),
        None => Err(StoreError::not_found(*key, typ, level)),
    }
}
