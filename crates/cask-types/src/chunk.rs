use std::fmt;

/// A typed, leveled byte buffer: the unit of storage and hashing.
///
/// Level 0 chunks are leaves holding raw blob bytes. Higher levels are
/// pointer chunks holding consecutive [`KEY_SIZE`](crate::KEY_SIZE)-byte key
/// slots. Trailing zero bytes may be trimmed from `buf`; readers treat any
/// byte past the end as zero.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    pub typ: String,
    pub level: u8,
    pub buf: Vec<u8>,
}

impl Chunk {
    pub fn new(typ: impl Into<String>, level: u8, buf: Vec<u8>) -> Self {
        Self {
            typ: typ.into(),
            level,
            buf,
        }
    }

    /// A zero-length chunk, the content of the `Empty` key.
    pub fn empty(typ: impl Into<String>, level: u8) -> Self {
        Self::new(typ, level, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop trailing zero bytes. Reversed on read by zero-extension.
    pub fn trim_zeros(&mut self) {
        let end = self
            .buf
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |pos| pos + 1);
        self.buf.truncate(end);
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk{{{:?}@{} {}}}", self.typ, self.level, hex::encode(&self.buf))
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("typ", &self.typ)
            .field("level", &self.level)
            .field("len", &self.buf.len())
            .finish()
    }
}
