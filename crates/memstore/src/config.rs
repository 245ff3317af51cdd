//! Memory store configuration.

/// Default maximum number of cached chunks.
pub const DEFAULT_CAPACITY: usize = 500;

/// Default log2 of the root fan-out.
pub const DEFAULT_ROOT_BITS: usize = 14;

/// Default log2 of the interior-node fan-out.
pub const DEFAULT_NODE_BITS: usize = 2;

/// Configuration for [`MemStore`](crate::MemStore).
#[derive(Debug, Clone)]
pub struct MemStoreConfig {
    /// Maximum number of chunks held before eviction kicks in.
    pub capacity: usize,

    /// log2 of the root node's child count. A wide root keeps the tree
    /// shallow for uniformly distributed keys.
    pub root_bits: usize,

    /// log2 of the child count of every other node.
    pub node_bits: usize,
}

impl Default for MemStoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            root_bits: DEFAULT_ROOT_BITS,
            node_bits: DEFAULT_NODE_BITS,
        }
    }
}

impl MemStoreConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the root fan-out exponent.
    pub fn with_root_bits(mut self, bits: usize) -> Self {
        self.root_bits = bits.max(1);
        self
    }

    /// Set the interior fan-out exponent.
    pub fn with_node_bits(mut self, bits: usize) -> Self {
        self.node_bits = bits.max(1);
        self
    }
}
