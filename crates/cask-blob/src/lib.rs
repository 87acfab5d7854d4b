//! Copy-on-write chunked blobs for the cask chunk store.
//!
//! A blob is a randomly readable and writable byte sequence stored as a
//! fanout tree of content-addressed chunks. Leaves hold raw bytes; every
//! level above holds key slots pointing one level down. Identical content
//! produces identical root keys, so unchanged subtrees are shared between
//! versions for free.
//!
//! # Lifecycle
//!
//! 1. [`Blob::open`] a [`Manifest`] over any [`cask_store::ContentStore`]
//! 2. read and write through [`Blob::io`], or [`Blob::truncate`]
//! 3. [`Blob::save`] to persist dirty chunks and get the new manifest
//!
//! Chunks modified between saves are kept in the blob's [`Stash`] under
//! `Private` keys that never leave the process.

pub mod blob;
pub mod config;
pub mod error;
pub mod idpool;
pub mod io;
pub mod manifest;
pub mod stash;

pub use blob::{Blob, MAX_DEPTH};
pub use config::{BlobConfig, MIN_CHUNK_SIZE};
pub use error::{BlobError, BlobResult};
pub use idpool::IdPool;
pub use io::{BlobIo, ReadOutcome, MAX_BLOB_SIZE};
pub use manifest::Manifest;
pub use stash::Stash;
