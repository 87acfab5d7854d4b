//! Cryptographic primitives for the cask chunk store.
//!
//! Chunks are addressed by a keyed BLAKE3 digest whose key is derived from
//! the chunk's type and tree level, so identical bytes stored under a
//! different type or at a different level never share a key.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::{hash_chunk, ChunkHasher};
