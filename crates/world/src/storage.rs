use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::{Chunk, ChunkPos};

/// In-memory arena of resident chunks with an LRU eviction policy.
/// Uses BTreeMap for deterministic iteration order.
pub struct ChunkStorage {
    chunks: BTreeMap<ChunkPos, Chunk>,
    lru: LruCache<ChunkPos, ()>,
    capacity: usize,
}

impl ChunkStorage {
    /// Create a storage with the desired maximum chunk count.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            chunks: BTreeMap::new(),
            lru: LruCache::new(cap),
            capacity: cap.get(),
        }
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true when no chunks are currently stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// True when the chunk is resident.
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Make `chunk` resident, evicting the least recently used chunk when full.
    pub fn insert(&mut self, chunk: Chunk) -> &mut Chunk {
        let pos = chunk.position();
        if !self.chunks.contains_key(&pos) {
            self.evict_if_needed();
        }
        self.touch(pos);
        match self.chunks.entry(pos) {
            Entry::Occupied(mut slot) => {
                slot.insert(chunk);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(chunk),
        }
    }

    /// Attempt to fetch a chunk immutably.
    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Fetch a chunk mutably (without creating it).
    pub fn get_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        if self.chunks.contains_key(&pos) {
            self.touch(pos);
        }
        self.chunks.get_mut(&pos)
    }

    fn touch(&mut self, pos: ChunkPos) {
        self.lru.put(pos, ());
    }

    fn evict_if_needed(&mut self) {
        while self.chunks.len() >= self.capacity {
            if let Some((oldest, _)) = self.lru.pop_lru() {
                self.chunks.remove(&oldest);
            } else {
                break;
            }
        }
    }
}
