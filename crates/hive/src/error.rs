//! Error and advisory types for hive operations.

use thiserror::Error;

/// Error type carried through admission and load callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by peer admission.
#[derive(Debug, Error)]
pub enum HiveError {
    /// The admission callback refused the peer; table state is unchanged.
    #[error("unable to admit peer: {0}")]
    AdmissionRejected(#[source] CallbackError),

    /// The peer's bin is at capacity. The peer stays usable by the
    /// transport but is not counted as a table resident.
    #[error("bucket {bin} full")]
    BucketFull { bin: usize },
}

/// Errors from record database persistence.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Advisory from [`Hive::off`](crate::Hive::off): the affected bin dropped
/// below its target population. A hint for discovery, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinShortage {
    /// The bin that lost a peer.
    pub bin: usize,
    /// Live peers remaining in that bin.
    pub live: usize,
}
