use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::TypeError;

/// Width of every key, in bytes.
pub const KEY_SIZE: usize = 64;

/// Length of the all-zero prefix that marks a key as special.
///
/// A special key looks like this (one cell per byte):
///
/// ```text
/// [0; 55] [kind] [payload; 8]
/// ```
///
/// - kind `0x00`, payload zero: `Empty`
/// - kind `0xFF`, payload all `0xFF`: `Invalid`
/// - kind `0xFE`: `Private`, payload is a big-endian stash id
///
/// Every other special pattern is reserved and never accepted from input.
pub const SPECIAL_PREFIX_SIZE: usize = KEY_SIZE - 9;

const PRIVATE_KIND: u8 = 0xFE;

/// Content-addressed identifier for a chunk.
///
/// Outside the reserved sub-space a `Key` is the keyed hash of a chunk's
/// type, level and bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// No content, zero bytes.
    pub const EMPTY: Key = Key([0u8; KEY_SIZE]);

    /// Placeholder for a detected corruption.
    pub const INVALID: Key = Key::invalid();

    const fn invalid() -> Self {
        let mut buf = [0u8; KEY_SIZE];
        let mut i = SPECIAL_PREFIX_SIZE;
        while i < KEY_SIZE {
            buf[i] = 0xFF;
            i += 1;
        }
        Self(buf)
    }

    /// Build a key from raw bytes.
    ///
    /// Any special pattern other than `Empty` is coerced to `Invalid`, so a
    /// hash output can never smuggle a reserved value into a tree.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        let key = Self(bytes);
        if key.is_special() && key != Self::EMPTY {
            return Self::INVALID;
        }
        key
    }

    /// Build a key read out of a pointer chunk slot.
    ///
    /// Like [`Key::from_bytes`], but `Private` keys are accepted as well.
    pub fn from_slot_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        let key = Self(bytes);
        if key.is_special() && !key.is_private() && key != Self::EMPTY {
            return Self::INVALID;
        }
        key
    }

    /// Decode a key from a byte slice of exactly [`KEY_SIZE`] bytes.
    pub fn decode(data: &[u8]) -> Result<Self, TypeError> {
        let bytes: [u8; KEY_SIZE] = data.try_into().map_err(|_| TypeError::InvalidLength {
            expected: KEY_SIZE,
            actual: data.len(),
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// A fresh `Private` key carrying a stash id.
    pub fn private(id: u64) -> Self {
        let mut buf = [0u8; KEY_SIZE];
        buf[SPECIAL_PREFIX_SIZE] = PRIVATE_KIND;
        buf[SPECIAL_PREFIX_SIZE + 1..].copy_from_slice(&id.to_be_bytes());
        Self(buf)
    }

    /// The stash id of a `Private` key, `None` for every other key.
    pub fn private_id(&self) -> Option<u64> {
        if !self.is_private() {
            return None;
        }
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.0[SPECIAL_PREFIX_SIZE + 1..]);
        Some(u64::from_be_bytes(id))
    }

    fn kind(&self) -> u8 {
        self.0[SPECIAL_PREFIX_SIZE]
    }

    /// Returns `true` if the key lives in the reserved sub-space.
    pub fn is_special(&self) -> bool {
        self.0[..SPECIAL_PREFIX_SIZE].iter().all(|&b| b == 0)
    }

    pub fn is_private(&self) -> bool {
        self.is_special() && self.kind() == PRIVATE_KIND
    }

    /// Special, yet neither `Empty` nor `Private`.
    pub fn is_reserved(&self) -> bool {
        self.is_special() && self.kind() != PRIVATE_KIND && *self != Self::EMPTY
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string, with the same coercion as [`Key::from_bytes`].
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.private_id() {
            return write!(f, "Key(private:{id})");
        }
        if self.is_empty() {
            return write!(f, "Key(empty)");
        }
        write!(f, "Key({})", self.short_hex())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Key> for [u8; KEY_SIZE] {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {KEY_SIZE}-byte key as bytes or a hex string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
        Key::from_hex(v).map_err(E::custom)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Key, E> {
        Key::decode(v).map_err(E::custom)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Key, A::Error> {
        let mut buf = Vec::with_capacity(KEY_SIZE);
        while let Some(b) = seq.next_element::<u8>()? {
            buf.push(b);
        }
        Key::decode(&buf).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(KeyVisitor)
        } else {
            deserializer.deserialize_bytes(KeyVisitor)
        }
    }
}
