//! Arena-backed prefix tree with an embedded access min-tree per node.
//!
//! Nodes live in a grow-only arena and refer to each other by index, so
//! the parent back-pointer every node carries is a plain `(handle, slot)`
//! pair. Interior nodes are kept after their leaf is evicted; the capacity
//! ceiling bounds chunks, not nodes.

use apiary_primitives::{Chunk, ChunkAddress, PrefixBits};
use tracing::trace;

type NodeHandle = usize;

/// A prefix subtree holding either child subtrees or one chunk, never both.
///
/// With fan-out `W = 1 << bits`, `access` is a `W - 1` slot array encoding
/// a complete binary min-tree over the access stamps reported by the
/// children:
/// - `access[0]` is the smallest stamp in this subtree;
/// - `access[1]` and `access[2]` are the smallest stamps in the first and
///   second halves of the children, so `access[0] = min(access[1],
///   access[2])`, and so on down to the last `W / 2` slots which summarize
///   child pairs.
///
/// A stamp of `0` means "no contribution". On a leaf only `access[0]` is
/// meaningful: the chunk's own stamp.
struct TreeNode {
    bits: usize,
    width: usize,
    children: Vec<Option<NodeHandle>>,
    access: Vec<u64>,
    entry: Option<Chunk>,
    parent: Option<(NodeHandle, usize)>,
}

pub(crate) struct PrefixTree {
    arena: Vec<TreeNode>,
    root: NodeHandle,
    node_bits: usize,
    entry_count: usize,
    capacity: usize,
    /// Monotone access counter; bumped on every add and every find hit.
    tick: u64,
}

impl PrefixTree {
    pub(crate) fn new(capacity: usize, root_bits: usize, node_bits: usize) -> Self {
        let mut tree = Self {
            arena: Vec::new(),
            root: 0,
            node_bits,
            entry_count: 0,
            capacity,
            tick: 0,
        };
        tree.root = tree.alloc(root_bits, None);
        tree
    }

    pub(crate) fn len(&self) -> usize {
        self.entry_count
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn alloc(&mut self, bits: usize, parent: Option<(NodeHandle, usize)>) -> NodeHandle {
        let width = 1 << bits;
        let handle = self.arena.len();
        self.arena.push(TreeNode {
            bits,
            width,
            children: vec![None; width],
            access: vec![0; width - 1],
            entry: None,
            parent,
        });
        if let Some((p, slot)) = parent {
            self.arena[p].children[slot] = Some(handle);
        }
        handle
    }

    fn child_or_alloc(&mut self, node: NodeHandle, slot: usize) -> NodeHandle {
        match self.arena[node].children[slot] {
            Some(child) => child,
            None => self.alloc(self.node_bits, Some((node, slot))),
        }
    }

    /// Bubbles a fresh access stamp from `node` up the embedded min-trees.
    ///
    /// At each level the touched slot is rewritten only while it held the
    /// subtree's previous minimum; the sibling's minimum is folded into the
    /// propagated value so every ancestor slot ends up with the true
    /// minimum of its subtree. Propagation stops as soon as the updated
    /// slot was not the minimum.
    fn update_access(&mut self, node: NodeHandle, stamp: u64) {
        let mut a = stamp;
        let mut n = node;
        let mut aidx = 0usize;
        let oa = self.arena[n].access[0];

        while self.arena[n].access[aidx] == oa {
            self.arena[n].access[aidx] = a;
            let sibling_min;
            if aidx > 0 {
                sibling_min = self.arena[n].access[((aidx - 1) ^ 1) + 1];
                aidx = (aidx - 1) >> 1;
            } else {
                let Some((parent, pidx)) = self.arena[n].parent else {
                    return;
                };
                sibling_min = match self.arena[parent].children[pidx ^ 1] {
                    Some(s) => self.arena[s].access[0],
                    None => 0,
                };
                n = parent;
                aidx = (self.arena[n].width + pidx - 2) >> 1;
            }
            if sibling_min != 0 && sibling_min < a {
                a = sibling_min;
            }
        }
    }

    /// Inserts `chunk`, splitting a colliding leaf level by level until the
    /// two keys diverge. Re-adding a present key refreshes the stored
    /// chunk and its access stamp.
    pub(crate) fn add(&mut self, chunk: Chunk) {
        self.tick += 1;
        let key = chunk.address();

        let mut node = self.root;
        let mut bitpos = 0usize;
        while self.arena[node].entry.is_none() {
            let bits = self.arena[node].bits;
            let slot = key.bits(bitpos, bits);
            match self.arena[node].children[slot] {
                Some(child) => {
                    bitpos += bits;
                    node = child;
                }
                None => {
                    node = self.alloc(self.node_bits, Some((node, slot)));
                    bitpos += bits;
                    break;
                }
            }
        }

        let resident_key = self.arena[node].entry.as_ref().map(|c| c.address());
        if resident_key == Some(key) {
            let tick = self.tick;
            self.arena[node].entry = Some(chunk);
            self.update_access(node, tick);
            return;
        }
        if resident_key.is_some() {
            // Split: push the resident down beside the new key until their
            // paths part. The resident keeps its access stamp.
            loop {
                let Some(resident) = self.arena[node].entry.take() else {
                    break;
                };
                let bits = self.arena[node].bits;
                let carried = self.arena[node].access[0];

                let slot = resident.address().bits(bitpos, bits);
                let child = self.child_or_alloc(node, slot);
                self.arena[child].entry = Some(resident);
                self.update_access(child, carried);

                let slot = key.bits(bitpos, bits);
                node = self.child_or_alloc(node, slot);
                bitpos += bits;
            }
        }

        self.arena[node].entry = Some(chunk);
        self.entry_count += 1;
        let tick = self.tick;
        self.update_access(node, tick);
    }

    /// Pure descent; `None` when a slot on the path is empty or the
    /// terminal leaf holds a different key. A hit bumps the tick and
    /// refreshes the leaf's access stamp.
    pub(crate) fn find(&mut self, key: &ChunkAddress) -> Option<Chunk> {
        let mut node = self.root;
        let mut bitpos = 0usize;
        while self.arena[node].entry.is_none() {
            let bits = self.arena[node].bits;
            let slot = key.bits(bitpos, bits);
            node = self.arena[node].children[slot]?;
            bitpos += bits;
        }

        let chunk = self.arena[node]
            .entry
            .as_ref()
            .filter(|c| c.address() == *key)
            .cloned()?;
        self.tick += 1;
        let tick = self.tick;
        self.update_access(node, tick);
        Some(chunk)
    }

    /// Evicts the chunk with the smallest access stamp.
    ///
    /// Descends by following the minimum through each node's min-tree,
    /// rewriting the slots passed on the way down with the surviving
    /// sibling minima (left subtree preferred on ties), then clears the
    /// leaf and re-establishes ancestor minima on the way back up.
    ///
    /// Panics when the recorded minimum cannot be located in any child:
    /// the min-tree no longer describes the leaves, and the store is
    /// corrupt.
    pub(crate) fn remove_oldest(&mut self) {
        let mut node = self.root;

        while self.arena[node].entry.is_none() {
            let width = self.arena[node].width;
            let mut aidx = 0usize;
            let min = self.arena[node].access[aidx];

            while aidx < width / 2 - 1 {
                let left = self.arena[node].access[aidx * 2 + 1];
                let right = self.arena[node].access[aidx * 2 + 2];
                if min == left {
                    self.arena[node].access[aidx] = right;
                    aidx = aidx * 2 + 1;
                } else if min == right {
                    self.arena[node].access[aidx] = left;
                    aidx = aidx * 2 + 2;
                } else {
                    panic!("access min-tree does not contain its own minimum");
                }
            }

            let pidx = aidx * 2 + 2 - width;
            let left = self.arena[node].children[pidx];
            let right = self.arena[node].children[pidx + 1];
            let left_min = left.map(|c| self.arena[c].access[0]);
            let right_min = right.map(|c| self.arena[c].access[0]);

            match (left, right) {
                (Some(child), _) if left_min == Some(min) => {
                    self.arena[node].access[aidx] = right_min.unwrap_or(0);
                    node = child;
                }
                (_, Some(child)) if right_min == Some(min) => {
                    self.arena[node].access[aidx] = left_min.unwrap_or(0);
                    node = child;
                }
                _ => panic!("access min-tree does not contain its own minimum"),
            }
        }

        if let Some(chunk) = &self.arena[node].entry {
            trace!(address = %chunk.address(), "evicting oldest chunk");
        }
        self.arena[node].entry = None;
        self.entry_count -= 1;
        self.arena[node].access[0] = 0;

        // Re-establish ancestor minima from the now-empty leaf upward.
        let mut n = node;
        let mut aidx = 0usize;
        loop {
            let reported = self.arena[n].access[aidx];
            if aidx > 0 {
                aidx = (aidx - 1) >> 1;
            } else {
                let Some((parent, pidx)) = self.arena[n].parent else {
                    return;
                };
                n = parent;
                aidx = (self.arena[n].width + pidx - 2) >> 1;
            }
            let current = self.arena[n].access[aidx];
            if reported != 0 && (reported < current || current == 0) {
                self.arena[n].access[aidx] = reported;
            }
        }
    }
}
