use async_trait::async_trait;

use crate::error::KvResult;

/// Opaque byte key/value store.
///
/// Implementations must satisfy:
/// - `get` of a key never written returns [`KvError::NotFound`](crate::KvError::NotFound).
/// - `put` is last-write-wins on overwrite.
/// - Concurrent `get`/`put` from distinct callers are safe.
#[async_trait]
pub trait ByteStore: Send + Sync {
    async fn get(&self, key: &[u8]) -> KvResult<Vec<u8>>;

    async fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()>;
}
