//! Byte key/value backends for the cask chunk store.
//!
//! The chunk store never talks to disk directly: it composes a backend key
//! from the content key, chunk type and level, and hands opaque bytes to a
//! [`ByteStore`].
//!
//! # Backends
//!
//! - [`InMemoryByteStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileByteStore`] -- one file per key inside a directory

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{KvError, KvResult};
pub use file::FileByteStore;
pub use memory::InMemoryByteStore;
pub use traits::ByteStore;
