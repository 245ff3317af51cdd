//! Bounded in-memory chunk cache, the fast front for the storage layer.
//!
//! Chunks are held in a multi-bit prefix tree keyed by chunk address. Every
//! interior node embeds a binary min-tree over its children's access
//! stamps, so the least-recently-used chunk can be found by following the
//! minimum from the root — eviction is approximate LRU driven by a single
//! monotone access counter rather than a recency list.
//!
//! All operations appear atomic: the whole tree sits behind one mutex.

mod config;
mod tree;

pub use config::{MemStoreConfig, DEFAULT_CAPACITY, DEFAULT_NODE_BITS, DEFAULT_ROOT_BITS};

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use apiary_primitives::{Chunk, ChunkAddress};

use crate::tree::PrefixTree;

/// Bounded in-memory chunk store with access-ordered eviction.
pub struct MemStore {
    tree: Mutex<PrefixTree>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemStore {
    /// Creates an empty store. The access counter starts fresh; it is
    /// never reset afterwards.
    pub fn new(config: MemStoreConfig) -> Self {
        Self {
            tree: Mutex::new(PrefixTree::new(
                config.capacity,
                config.root_bits,
                config.node_bits,
            )),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Stores a chunk, evicting the least recently used one first when the
    /// store is at capacity.
    pub fn put(&self, chunk: Chunk) {
        let mut tree = self.tree.lock();
        if tree.len() >= tree.capacity() {
            tree.remove_oldest();
        }
        tree.add(chunk);
    }

    /// Fetches a chunk by address. A hit refreshes the chunk's access
    /// stamp.
    pub fn get(&self, address: &ChunkAddress) -> Option<Chunk> {
        let found = self.tree.lock().find(address);
        match &found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Number of chunks currently held.
    pub fn len(&self) -> usize {
        self.tree.lock().len()
    }

    /// True when no chunks are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of chunks held before eviction.
    pub fn capacity(&self) -> usize {
        self.tree.lock().capacity()
    }

    /// Hit/miss counters and occupancy.
    pub fn stats(&self) -> MemStoreStats {
        let tree = self.tree.lock();
        MemStoreStats {
            capacity: tree.capacity(),
            size: tree.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new(MemStoreConfig::default())
    }
}

/// Statistics snapshot for the chunk store.
#[derive(Debug, Clone)]
pub struct MemStoreStats {
    /// Maximum number of cached chunks.
    pub capacity: usize,
    /// Chunks currently cached.
    pub size: usize,
    /// Lookup hits.
    pub hits: u64,
    /// Lookup misses.
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> ChunkAddress {
        ChunkAddress::right_padding_from(&[byte])
    }

    fn chunk(byte: u8) -> Chunk {
        Chunk::new(address(byte), vec![byte; 8])
    }

    fn small_store(capacity: usize) -> MemStore {
        MemStore::new(
            MemStoreConfig::default()
                .with_capacity(capacity)
                .with_root_bits(4)
                .with_node_bits(2),
        )
    }

    #[test]
    fn test_put_get_round_trip() {
        let store = small_store(8);
        store.put(chunk(0x11));
        assert_eq!(store.get(&address(0x11)), Some(chunk(0x11)));
        assert_eq!(store.get(&address(0x22)), None);
    }

    #[test]
    fn test_eviction_order() {
        // Capacity 4: putting A..E evicts A; touching B twice then putting
        // F evicts C.
        let store = small_store(4);
        for byte in [0xa1, 0xb2, 0xc3, 0xd4] {
            store.put(chunk(byte));
        }
        store.put(chunk(0xe5));
        assert_eq!(store.get(&address(0xa1)), None);
        assert_eq!(store.get(&address(0xe5)), Some(chunk(0xe5)));

        let _ = store.get(&address(0xb2));
        let _ = store.get(&address(0xb2));
        store.put(chunk(0xf6));
        assert_eq!(store.get(&address(0xc3)), None);
        assert_eq!(store.get(&address(0xb2)), Some(chunk(0xb2)));
        assert_eq!(store.get(&address(0xd4)), Some(chunk(0xd4)));
    }

    #[test]
    fn test_capacity_ceiling() {
        let store = small_store(16);
        for i in 0..200u8 {
            store.put(chunk(i));
            assert!(store.len() <= 16);
        }
        assert_eq!(store.len(), 16);
    }

    #[test]
    fn test_survives_fewer_than_capacity_intervening_puts() {
        let store = small_store(8);
        store.put(chunk(0x01));
        for i in 0x10..0x17u8 {
            store.put(chunk(i));
        }
        // Seven intervening puts on a capacity-8 store: 0x01 is the
        // oldest but still resident.
        assert_eq!(store.get(&address(0x01)), Some(chunk(0x01)));
    }

    #[test]
    fn test_default_store() {
        let store = MemStore::default();
        assert!(store.is_empty());
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_stats() {
        let store = small_store(4);
        store.put(chunk(0x01));
        store.get(&address(0x01));
        store.get(&address(0x02));

        let stats = store.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
