//! Fixed-capacity bin of live peers.

use std::sync::Arc;

use parking_lot::RwLock;

use apiary_primitives::OverlayAddress;

use crate::error::HiveError;
use crate::peer::HivePeer;

/// One proximity bin of connected peers.
///
/// Capacity is fixed at construction. A full bucket rejects insertion
/// instead of displacing a resident: the transport drops idle peers on its
/// own timer, so the table never preempts a live connection.
pub(crate) struct Bucket<P> {
    bin: usize,
    capacity: usize,
    peers: RwLock<Vec<Arc<P>>>,
}

impl<P: HivePeer> Bucket<P> {
    pub(crate) fn new(bin: usize, capacity: usize) -> Self {
        Self {
            bin,
            capacity,
            peers: RwLock::new(Vec::new()),
        }
    }

    /// Appends `peer`, or reports the bucket full without mutating it.
    pub(crate) fn insert(&self, peer: Arc<P>) -> Result<(), HiveError> {
        let mut peers = self.peers.write();
        if peers.len() >= self.capacity {
            return Err(HiveError::BucketFull { bin: self.bin });
        }
        peers.push(peer);
        Ok(())
    }

    /// Removes the peer with the given address, if present.
    pub(crate) fn remove(&self, addr: &OverlayAddress) -> bool {
        let mut peers = self.peers.write();
        let before = peers.len();
        peers.retain(|p| p.address() != *addr);
        peers.len() < before
    }

    pub(crate) fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Snapshot of the resident peers, in insertion order.
    pub(crate) fn peers(&self) -> Vec<Arc<P>> {
        self.peers.read().clone()
    }
}
