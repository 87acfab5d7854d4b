use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cask_store::ContentStore;
use cask_types::{Chunk, Key, KEY_SIZE};
use tracing::{debug, trace};

use crate::error::{BlobError, BlobResult};
use crate::manifest::Manifest;
use crate::stash::Stash;

/// Upper bound on tree depth.
///
/// Leaf indexes are `u64` and every level divides by a fanout of at least 2,
/// so no tree is ever deeper than this. Recursive walks (`save_chunk`,
/// `discard_after`) never nest further.
pub const MAX_DEPTH: u8 = 64;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A randomly writable byte sequence stored as a fanout tree of chunks.
///
/// Leaves (level 0) hold up to `chunk_size` bytes; pointer chunks hold
/// `fanout` key slots. Nodes touched since the last [`Blob::save`] are
/// private to this blob's [`Stash`]; everything else is shared and
/// immutable in the store, and gets cloned before modification.
///
/// Not safe for concurrent mutation: one owner drives a blob at a time.
pub struct Blob {
    stash: Stash,
    m: Manifest,
    depth: u8,
}

impl Blob {
    /// Open a blob over `store` described by `manifest`.
    ///
    /// The manifest is copied; the caller keeps the original. An `Empty`
    /// root is fine, but every tuning field must be valid.
    pub fn open(store: Arc<dyn ContentStore>, manifest: &Manifest) -> BlobResult<Self> {
        manifest.validate()?;
        let mut blob = Self {
            stash: Stash::new(store),
            m: manifest.clone(),
            depth: 0,
        };
        blob.depth = blob.compute_level(blob.m.size);
        Ok(blob)
    }

    /// Current byte size.
    pub fn size(&self) -> u64 {
        self.m.size
    }

    /// Number of pointer levels above the leaves.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The working manifest. Its root may be a private key until saved.
    pub fn manifest(&self) -> &Manifest {
        &self.m
    }

    /// Number of private (unsaved) chunks held by this blob.
    pub fn private_chunks(&self) -> usize {
        self.stash.len()
    }

    pub(crate) fn chunk_size(&self) -> u64 {
        u64::from(self.m.chunk_size)
    }

    pub(crate) fn set_size(&mut self, size: u64) {
        self.m.size = size;
    }

    /// Adjust the size. Shrinking loses data past `size`; growing reads back
    /// as zeroes.
    pub async fn truncate(&mut self, size: u64) -> BlobResult<()> {
        debug!(from = self.m.size, to = size, "truncate");
        if size == 0 {
            self.m.root = Key::EMPTY;
            self.m.size = 0;
            self.depth = 0;
            self.stash.clear();
            return Ok(());
        }

        let off = size - 1;
        let idxs = local_chunk_indexes(self.m.fanout, off / self.chunk_size());

        if size > self.m.size {
            self.grow(idxs.len() as u8).await?;
            self.m.size = size;
            return Ok(());
        }
        if size == self.m.size {
            return Ok(());
        }

        self.shrink(idxs.len() as u8).await?;
        // makes the whole spine down to the new last byte private
        self.lookup_for_write(off).await?;

        let typ = self.m.typ.clone();
        let mut key = self.m.root;
        for level in (1..=self.depth).rev() {
            let idx = digit(&idxs, level);
            self.discard_after(key, idx + 1, level).await?;
            let parent = self.stash.get_private_mut(&key, &typ, level)?;
            key = slot_key(&parent.buf, idx);
            debug_assert!(key.is_private(), "truncate spine not private at level {level}");
        }

        let loff = (off % self.chunk_size()) as usize + 1;
        let leaf = self.stash.get_private_mut(&key, &typ, 0)?;
        leaf.buf[loff..].fill(0);

        self.m.size = size;
        Ok(())
    }

    /// Persist every private chunk and return the manifest of the result.
    pub async fn save(&mut self) -> BlobResult<Manifest> {
        // reopening recomputes depth from size alone, so the tree must be
        // exactly that deep before it is written out
        let level = self.compute_level(self.m.size);
        if self.depth > level {
            self.shrink(level).await?;
        } else if self.depth < level {
            self.grow(level).await?;
        }

        let root = self.save_chunk(self.m.root, self.depth).await?;
        self.m.root = root;
        debug!(root = ?root, size = self.m.size, depth = self.depth, "saved blob");
        Ok(self.m.clone())
    }

    fn compute_level(&self, size: u64) -> u8 {
        if size == 0 {
            return 0;
        }
        let mut idx = (size - 1) / self.chunk_size();
        let mut level = 0;
        while idx > 0 {
            idx /= u64::from(self.m.fanout);
            level += 1;
        }
        level
    }

    fn chunk_size_for_level(&self, level: u8) -> usize {
        match level {
            0 => self.m.chunk_size as usize,
            _ => self.m.fanout as usize * KEY_SIZE,
        }
    }

    /// Fetch the leaf holding byte `off`. Read-only; the chunk may still be
    /// zero-trimmed.
    pub(crate) async fn lookup(&self, off: u64) -> BlobResult<Cow<'_, Chunk>> {
        let idxs = local_chunk_indexes(self.m.fanout, off / self.chunk_size());
        let mut key = self.m.root;
        for level in (1..=self.depth).rev() {
            let idx = digit(&idxs, level);
            let chunk = self.stash.get(&key, &self.m.typ, level).await?;
            let child = slot_key(&chunk.buf, idx);
            if child.is_reserved() {
                return Err(BlobError::Corrupt {
                    parent: key,
                    slot: idx,
                    level,
                });
            }
            key = child;
        }
        Ok(self.stash.get(&key, &self.m.typ, 0).await?)
    }

    /// Fetch the leaf holding byte `off`, cloning every node on the way down
    /// so the returned chunk is private, full size and writable.
    pub(crate) async fn lookup_for_write(&mut self, off: u64) -> BlobResult<&mut Chunk> {
        let idxs = local_chunk_indexes(self.m.fanout, off / self.chunk_size());
        self.grow(idxs.len() as u8).await?;

        let typ = self.m.typ.clone();
        let mut level = self.depth;
        let size = self.chunk_size_for_level(level);
        let (root, _) = self
            .stash
            .clone_chunk(&self.m.root, &typ, level, size)
            .await?;
        self.m.root = root;

        let mut parent = root;
        while level > 0 {
            let idx = digit(&idxs, level);
            let child = slot_key(&self.stash.get_private_mut(&parent, &typ, level)?.buf, idx);
            if child.is_reserved() {
                return Err(BlobError::Corrupt {
                    parent,
                    slot: idx,
                    level,
                });
            }

            // no-op when already private
            let size = self.chunk_size_for_level(level - 1);
            let (child, _) = self.stash.clone_chunk(&child, &typ, level - 1, size).await?;
            let chunk = self.stash.get_private_mut(&parent, &typ, level)?;
            set_slot(&mut chunk.buf, idx, &child);

            parent = child;
            level -= 1;
        }

        let leaf = self.stash.get_private_mut(&parent, &typ, 0)?;
        debug_assert_eq!(leaf.buf.len(), self.m.chunk_size as usize);
        Ok(leaf)
    }

    /// Add pointer levels on top until the tree is `level` deep. The old
    /// root becomes the leftmost child; other slots stay `Empty`.
    async fn grow(&mut self, level: u8) -> BlobResult<()> {
        debug_assert!(level <= MAX_DEPTH);
        let size = self.chunk_size_for_level(1);
        while self.depth < level {
            let (key, chunk) = self
                .stash
                .clone_chunk(&Key::EMPTY, &self.m.typ, self.depth + 1, size)
                .await?;
            set_slot(&mut chunk.buf, 0, &self.m.root);
            self.m.root = key;
            self.depth += 1;
            trace!(depth = self.depth, "grew tree");
        }
        Ok(())
    }

    /// Remove pointer levels until the tree is `level` deep, keeping only
    /// the leftmost subtree and dropping every private node outside it.
    async fn shrink(&mut self, level: u8) -> BlobResult<()> {
        while self.depth > level {
            let root = self.m.root;
            if root.is_private() {
                self.discard_after(root, 1, self.depth).await?;
            }
            let first = {
                let chunk = self.stash.get(&root, &self.m.typ, self.depth).await?;
                slot_key(&chunk.buf, 0)
            };
            if first.is_reserved() {
                return Err(BlobError::Corrupt {
                    parent: root,
                    slot: 0,
                    level: self.depth,
                });
            }
            self.stash.drop_key(&root);
            self.m.root = first;
            self.depth -= 1;
            trace!(depth = self.depth, "shrank tree");
        }
        Ok(())
    }

    /// Empty every slot from `from` on in the private pointer chunk `key`,
    /// recursively dropping private subtrees hanging off those slots.
    fn discard_after(&mut self, key: Key, from: usize, level: u8) -> BoxFuture<'_, BlobResult<()>> {
        Box::pin(async move {
            if level == 0 {
                return Ok::<(), BlobError>(());
            }
            let typ = self.m.typ.clone();
            for idx in from..self.m.fanout as usize {
                let child = slot_key(&self.stash.get_private_mut(&key, &typ, level)?.buf, idx);
                if child.is_private() {
                    // private pointers may hold private children of their own
                    self.discard_after(child, 0, level - 1).await?;
                    self.stash.drop_key(&child);
                }
                let chunk = self.stash.get_private_mut(&key, &typ, level)?;
                set_slot(&mut chunk.buf, idx, &Key::EMPTY);
            }
            Ok::<(), BlobError>(())
        })
    }

    /// Persist the subtree under `key`, children first, and return its
    /// content key. Durable keys are returned untouched.
    fn save_chunk(&mut self, key: Key, level: u8) -> BoxFuture<'_, BlobResult<Key>> {
        Box::pin(async move {
            if !key.is_private() {
                return Ok::<Key, BlobError>(key);
            }
            let typ = self.m.typ.clone();

            if level > 0 {
                let slots = self.stash.get_private_mut(&key, &typ, level)?.buf.len() / KEY_SIZE;
                for idx in 0..slots {
                    let child = slot_key(&self.stash.get_private_mut(&key, &typ, level)?.buf, idx);
                    if child.is_reserved() {
                        return Err(BlobError::Corrupt {
                            parent: key,
                            slot: idx,
                            level,
                        });
                    }
                    // recurses at most `level` deep
                    let saved = self.save_chunk(child, level - 1).await?;
                    let chunk = self.stash.get_private_mut(&key, &typ, level)?;
                    set_slot(&mut chunk.buf, idx, &saved);
                }
            }

            // the stash trims a copy, so the private chunk stays full size
            // if this save fails or is dropped mid-flight
            let saved = self.stash.save(&key, &typ, level).await?;
            Ok(saved)
        })
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("manifest", &self.m)
            .field("depth", &self.depth)
            .field("stash", &self.stash)
            .finish()
    }
}

/// Split a global leaf index into base-`fanout` digits, least significant
/// (closest to the leaves) first.
///
/// The digits are produced bottom up but consumed top down, so the whole
/// list is built once before a walk.
pub(crate) fn local_chunk_indexes(fanout: u32, mut chunk: u64) -> Vec<u32> {
    let fanout = u64::from(fanout);
    let mut index = Vec::with_capacity(8);
    while chunk > 0 {
        index.push((chunk % fanout) as u32);
        chunk /= fanout;
    }
    index
}

/// The slot to follow out of a pointer chunk at `level`.
fn digit(idxs: &[u32], level: u8) -> usize {
    idxs.get(level as usize - 1).copied().unwrap_or(0) as usize
}

/// Read key slot `idx`, treating bytes past the end of a trimmed buffer as
/// zero.
fn slot_key(buf: &[u8], idx: usize) -> Key {
    let mut bytes = [0u8; KEY_SIZE];
    let start = idx * KEY_SIZE;
    if start < buf.len() {
        let end = (start + KEY_SIZE).min(buf.len());
        bytes[..end - start].copy_from_slice(&buf[start..end]);
    }
    Key::from_slot_bytes(bytes)
}

/// Write key slot `idx` of a full-size private pointer buffer.
fn set_slot(buf: &mut [u8], idx: usize, key: &Key) {
    let start = idx * KEY_SIZE;
    buf[start..start + KEY_SIZE].copy_from_slice(key.as_bytes());
}
