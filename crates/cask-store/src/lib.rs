//! Content-addressed chunk storage for the cask chunk store.
//!
//! Every chunk is stored immutably under the keyed hash of its type, level
//! and bytes. Reading a chunk needs all three coordinates, so the same bytes
//! stored as a leaf and as a pointer chunk never alias.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryChunkStore`] -- `HashMap`-based store for tests and embedding
//! - [`KvChunkStore`] -- composite-key layout over any [`cask_kv::ByteStore`]
//!
//! # Design Rules
//!
//! 1. Chunks are immutable once written (content-addressing guarantees this).
//! 2. `add` is idempotent: identical chunks yield the same key and one copy.
//! 3. The `Empty` key never reaches a backend; other special keys are absent.
//! 4. All backend errors are propagated, never silently ignored.

pub mod error;
pub mod kv;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use kv::{composite_key, KvChunkStore};
pub use memory::InMemoryChunkStore;
pub use traits::{handle_get, ContentStore};
