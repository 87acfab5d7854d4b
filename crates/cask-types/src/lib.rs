//! Foundation types for the cask chunk store.
//!
//! Every other cask crate depends on `cask-types`.
//!
//! # Key Types
//!
//! - [`Key`] -- 64-byte content identifier with a reserved sentinel sub-space
//!   (`Empty`, `Invalid`, and stash-local `Private` keys)
//! - [`Chunk`] -- typed, leveled byte buffer, the unit of storage and hashing

pub mod chunk;
pub mod error;
pub mod key;

pub use chunk::Chunk;
pub use error::TypeError;
pub use key::{Key, KEY_SIZE, SPECIAL_PREFIX_SIZE};
