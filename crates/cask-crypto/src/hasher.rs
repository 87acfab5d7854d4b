use cask_types::{Chunk, Key, KEY_SIZE};

/// Context string for deriving per-(type, level) hashing keys.
const KEY_CONTEXT: &str = "cask chunk store 2026-01 per-type-level chunk key";

/// Domain-separated chunk hasher.
///
/// Each hasher carries a scheme prefix. The hashing key for a chunk is
/// derived from `scheme ‖ type ‖ level`, and the chunk bytes are fed through
/// keyed BLAKE3 in extendable-output mode to produce a full [`KEY_SIZE`]
/// digest. The level is always the single trailing byte of the key material,
/// which keeps the `(type, level)` encoding unambiguous.
pub struct ChunkHasher {
    scheme: &'static str,
}

impl ChunkHasher {
    /// The hasher used by every store in this workspace.
    pub const DEFAULT: Self = Self { scheme: "cask:" };

    /// Create a hasher with a custom scheme prefix.
    pub const fn new(scheme: &'static str) -> Self {
        Self { scheme }
    }

    /// Hash a chunk into its content key.
    ///
    /// An empty buffer hashes to [`Key::EMPTY`] without touching BLAKE3.
    pub fn hash(&self, chunk: &Chunk) -> Key {
        if chunk.buf.is_empty() {
            return Key::EMPTY;
        }
        let mut hasher = blake3::Hasher::new_keyed(&self.chunk_key(&chunk.typ, chunk.level));
        hasher.update(&chunk.buf);
        let mut out = [0u8; KEY_SIZE];
        hasher.finalize_xof().fill(&mut out);
        Key::from_bytes(out)
    }

    /// Verify that a chunk hashes to the expected key.
    pub fn verify(&self, chunk: &Chunk, expected: &Key) -> bool {
        self.hash(chunk) == *expected
    }

    fn chunk_key(&self, typ: &str, level: u8) -> [u8; 32] {
        let mut material = Vec::with_capacity(self.scheme.len() + typ.len() + 1);
        material.extend_from_slice(self.scheme.as_bytes());
        material.extend_from_slice(typ.as_bytes());
        material.push(level);
        blake3::derive_key(KEY_CONTEXT, &material)
    }

    /// The scheme prefix used by this hasher.
    pub fn scheme(&self) -> &str {
        self.scheme
    }
}

/// Hash a chunk with [`ChunkHasher::DEFAULT`].
pub fn hash_chunk(chunk: &Chunk) -> Key {
    ChunkHasher::DEFAULT.hash(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chunk_is_empty_key() {
        let c = Chunk::new("testchunk", 42, Vec::new());
        assert_eq!(hash_chunk(&c), Key::EMPTY);
    }

    #[test]
    fn some_zeroes_are_not_empty() {
        let c = Chunk::new("testchunk", 42, vec![0, 0, 0]);
        let k = hash_chunk(&c);
        assert_ne!(k, Key::EMPTY);
        assert!(!k.is_special());
    }

    #[test]
    fn hash_is_deterministic() {
        let c = Chunk::new("blob", 0, b"hello world".to_vec());
        assert_eq!(hash_chunk(&c), hash_chunk(&c.clone()));
    }

    #[test]
    fn level_separates_domains() {
        let leaf = Chunk::new("blob", 0, b"same bytes".to_vec());
        let ptr = Chunk::new("blob", 1, b"same bytes".to_vec());
        assert_ne!(hash_chunk(&leaf), hash_chunk(&ptr));
    }

    #[test]
    fn type_separates_domains() {
        let a = Chunk::new("file", 0, b"same bytes".to_vec());
        let b = Chunk::new("dir", 0, b"same bytes".to_vec());
        assert_ne!(hash_chunk(&a), hash_chunk(&b));
    }

    #[test]
    fn type_and_level_do_not_alias() {
        // "ab" at level b'c' must not collide with "abc" at any level
        let a = Chunk::new("ab", b'c', b"data".to_vec());
        let b = Chunk::new("abc", 0, b"data".to_vec());
        assert_ne!(hash_chunk(&a), hash_chunk(&b));
    }

    #[test]
    fn custom_scheme() {
        let c = Chunk::new("blob", 0, b"data".to_vec());
        let custom = ChunkHasher::new("other:");
        assert_ne!(custom.hash(&c), ChunkHasher::DEFAULT.hash(&c));
        assert_eq!(custom.scheme(), "other:");
    }

    #[test]
    fn verify_detects_tampering() {
        let c = Chunk::new("blob", 0, b"original".to_vec());
        let k = hash_chunk(&c);
        assert!(ChunkHasher::DEFAULT.verify(&c, &k));
        let tampered = Chunk::new("blob", 0, b"tampered".to_vec());
        assert!(!ChunkHasher::DEFAULT.verify(&tampered, &k));
    }

    #[test]
    fn digest_fills_the_whole_key() {
        let c = Chunk::new("blob", 0, b"x".to_vec());
        let k = hash_chunk(&c);
        assert_eq!(hex::encode(k.as_bytes()).len(), KEY_SIZE * 2);
        // the XOF tail must not be zero padding
        assert!(k.as_bytes()[32..].iter().any(|&b| b != 0));
    }
}
