//! The live peer capability handed in by the transport.

use std::time::SystemTime;

use apiary_primitives::OverlayAddress;

/// A connected peer as seen by the routing table.
///
/// Implementations are owned by the transport layer. The table only holds
/// shared references; admitting or removing a peer never tears down its
/// network resources.
pub trait HivePeer: Send + Sync + 'static {
    /// Overlay address identifying the peer. Stable for the peer's
    /// lifetime.
    fn address(&self) -> OverlayAddress;

    /// Dialable endpoint, kept on the peer's node record for reconnection.
    fn url(&self) -> &str;

    /// Wall-clock instant of the last observed activity.
    fn last_active(&self) -> SystemTime;

    /// Signals the transport to drop the underlying connection.
    fn disconnect(&self);
}
