use std::collections::BTreeSet;

/// Allocator for small, dense, recyclable ids.
///
/// Freed ids are handed out again (smallest first) before the high-water
/// mark grows.
#[derive(Debug, Default)]
pub struct IdPool {
    next: u64,
    free: BTreeSet<u64>,
}

impl IdPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self) -> u64 {
        if let Some(id) = self.free.pop_first() {
            return id;
        }
        let id = self.next;
        self.next += 1;
        id
    }

    /// Return an id to the pool. Ids never handed out are ignored.
    pub fn put(&mut self, id: u64) {
        if id >= self.next {
            return;
        }
        self.free.insert(id);
        // shrink the high-water mark while its top is free
        while self.next > 0 && self.free.remove(&(self.next - 1)) {
            self.next -= 1;
        }
    }

    /// Number of ids currently handed out.
    pub fn in_use(&self) -> usize {
        self.next as usize - self.free.len()
    }
}
