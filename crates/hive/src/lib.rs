//! Proximity-ordered routing table over live peers, backed by a persisted
//! record database of known peers.
//!
//! # Architecture
//!
//! The table keeps one bucket of connected peers per proximity bin, plus a
//! [`NodeRecord`] database of every peer ever sighted:
//! - the transport reports connections through [`Hive::on`] and
//!   disconnections through [`Hive::off`];
//! - lookups ([`Hive::find_closest`]) serve peers ordered by XOR distance,
//!   treating the saturated neighborhood — the bins from `prox_limit` up —
//!   as a single bin;
//! - the connection manager pulls reconnection candidates from
//!   [`Hive::find_best`], which walks the record bins round-robin under
//!   exponential retry backoff.
//!
//! The proximity limit moves as peers come and go so that bins below it are
//! never empty and the neighborhood keeps its target population.
//!
//! # Locking
//!
//! One readers-writer lock covers the mutable table state (`prox_limit`,
//! `prox_size`, `count`); each bucket and the record database carry their
//! own. Bucket and record-database locks are never held at the same time.
//! Callbacks passed to [`Hive::on_with`]/[`Hive::off_with`] run while the
//! table lock is held and must not call back into the table.

mod bucket;
mod config;
mod db;
mod error;
mod peer;

pub use config::{
    HiveConfig, DEFAULT_BUCKET_SIZE, DEFAULT_CONN_RETRY_EXP, DEFAULT_INITIAL_RETRY_INTERVAL,
    DEFAULT_MAX_IDLE_INTERVAL, DEFAULT_MAX_PROX, DEFAULT_PROX_BIN_SIZE, DEFAULT_PURGE_INTERVAL,
};
pub use db::NodeRecord;
pub use error::{BinShortage, CallbackError, HiveError, PersistenceError};
pub use peer::HivePeer;

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use alloy_primitives::hex;
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use apiary_primitives::{distance_cmp, key_range, proximity, OverlayAddress};

use crate::bucket::Bucket;
use crate::db::{unix_millis_now, RecordDb};

/// Mutable table state, guarded by the table lock.
struct ProxState {
    /// Lowest bin index of the saturated neighborhood.
    prox_limit: usize,
    /// Live peers in bins `[prox_limit, max_prox]`.
    prox_size: usize,
    /// Live peers counted as table residents.
    count: usize,
}

/// The routing table: live peers bucketed by proximity order, anchored at
/// the local overlay address.
pub struct Hive<P: HivePeer> {
    base: OverlayAddress,
    config: HiveConfig,
    buckets: Vec<Bucket<P>>,
    state: RwLock<ProxState>,
    db: RecordDb<P>,
}

impl<P: HivePeer> Hive<P> {
    /// Creates an empty table anchored at `base`.
    pub fn new(base: OverlayAddress, config: HiveConfig) -> Self {
        let buckets = (0..=config.max_prox)
            .map(|bin| Bucket::new(bin, config.bucket_size))
            .collect();
        info!(%base, max_prox = config.max_prox, "hive initialized");
        Self {
            base,
            db: RecordDb::new(base, config.clone()),
            buckets,
            state: RwLock::new(ProxState {
                prox_limit: 0,
                prox_size: 0,
                count: 0,
            }),
            config,
        }
    }

    /// The table's anchor address.
    pub fn base(&self) -> &OverlayAddress {
        &self.base
    }

    /// Number of live peers resident in the table.
    pub fn count(&self) -> usize {
        self.state.read().count
    }

    /// Number of known peer records.
    pub fn db_count(&self) -> usize {
        self.db.count()
    }

    /// The bin a peer or chunk address falls into, capped at `max_prox`.
    fn proximity_bin(&self, addr: &OverlayAddress) -> usize {
        proximity(&self.base, addr).min(self.config.max_prox)
    }

    /// Admits a connected peer. See [`on_with`](Self::on_with).
    pub fn on(&self, peer: Arc<P>) -> Result<(), HiveError> {
        self.on_with(peer, |_, _| Ok(()))
    }

    /// Admits a peer the transport has connected.
    ///
    /// The peer's record is looked up or created and the live reference
    /// attached, then `cb` runs with the record and the peer. A callback
    /// error rejects the peer and leaves the table unchanged. On success
    /// the record is marked connected and the peer inserted into its
    /// bucket; a full bucket is reported as a soft error without touching
    /// the resident count.
    ///
    /// `cb` executes while the table lock is held and must not call back
    /// into the table.
    pub fn on_with(
        &self,
        peer: Arc<P>,
        cb: impl FnOnce(&NodeRecord, &P) -> Result<(), CallbackError>,
    ) -> Result<(), HiveError> {
        let mut state = self.state.write();
        let address = peer.address();
        let bin = self.proximity_bin(&address);

        let record = self.db.attach(bin, &peer);
        cb(&record, peer.as_ref()).map_err(HiveError::AdmissionRejected)?;
        self.db.mark_connected(&address, unix_millis_now());

        if let Err(err) = self.buckets[bin].insert(peer) {
            debug!(peer = %address, bin, "peer not admitted, bucket full");
            return Err(err);
        }
        debug!(peer = %address, bin, "peer admitted");
        state.count += 1;
        self.adjust_prox_limit(&mut state, bin, false);
        Ok(())
    }

    /// Removes a peer taken offline. See [`off_with`](Self::off_with).
    pub fn off(&self, peer: &P) -> Option<BinShortage> {
        self.off_with(peer, |_, _| {})
    }

    /// Removes a peer the transport has disconnected.
    ///
    /// Unknown peers are tolerated as a no-op. The record keeps the peer's
    /// history but loses its live reference; `cb` observes the record as it
    /// was while connected, together with the detached peer. The returned
    /// [`BinShortage`] advises that the affected bin fell below its target
    /// population.
    ///
    /// `cb` executes while the table lock is held and must not call back
    /// into the table.
    pub fn off_with(
        &self,
        peer: &P,
        cb: impl FnOnce(&NodeRecord, Option<&Arc<P>>),
    ) -> Option<BinShortage> {
        let mut state = self.state.write();
        let address = peer.address();
        let bin = self.proximity_bin(&address);

        if !self.buckets[bin].remove(&address) {
            return None;
        }
        debug!(peer = %address, bin, "peer removed");
        state.count -= 1;
        self.adjust_prox_limit(&mut state, bin, true);

        if let Some((record, detached)) = self.db.detach(&address) {
            cb(&record, detached.as_ref());
        }

        let live = self.buckets[bin].len();
        (live < self.config.bucket_size).then_some(BinShortage { bin, live })
    }

    /// Re-establishes the saturated-neighborhood invariants after a change
    /// to `bin`.
    ///
    /// Caller holds the table lock. The limit contracts upward after
    /// insertions while dropping the lowest neighborhood bin keeps the
    /// population at target, and expands downward after removals until the
    /// target is met again (or bin 0 is reached).
    fn adjust_prox_limit(&self, state: &mut ProxState, bin: usize, removal: bool) {
        if bin < state.prox_limit && self.buckets[bin].len() > 0 {
            return;
        }
        trace!(
            size = state.prox_size,
            limit = state.prox_limit,
            bin,
            removal,
            "adjusting prox limit"
        );

        if removal {
            if bin >= state.prox_limit {
                state.prox_size -= 1;
            }
            while (state.prox_size < self.config.prox_bin_size || bin < state.prox_limit)
                && state.prox_limit > 0
            {
                state.prox_limit -= 1;
                state.prox_size += self.buckets[state.prox_limit].len();
                trace!(
                    size = state.prox_size,
                    limit = state.prox_limit,
                    "prox neighborhood expanded"
                );
            }
            return;
        }

        state.prox_size += 1;
        while state.prox_limit < self.config.max_prox
            && self.buckets[state.prox_limit].len() > 0
            && state.prox_size - self.buckets[state.prox_limit].len() >= self.config.prox_bin_size
        {
            state.prox_size -= self.buckets[state.prox_limit].len();
            state.prox_limit += 1;
            trace!(
                size = state.prox_size,
                limit = state.prox_limit,
                "prox neighborhood contracted"
            );
        }
    }

    /// Returns up to `max` live peers ordered by ascending XOR distance to
    /// `target` (all eligible peers when `max` is 0).
    ///
    /// The scan starts at the target's bin — normalized into the saturated
    /// neighborhood, which is treated as one bin — then zig-zags outward:
    /// farther bins first, then closer ones, until enough peers are
    /// collected or the table is exhausted.
    pub fn find_closest(&self, target: &OverlayAddress, max: usize) -> Vec<Arc<P>> {
        let state = self.state.read();
        let mut result = ClosestPeers::new(*target);

        let mut index = self.proximity_bin(target);
        let mut start = index;
        let mut down = false;
        if index >= state.prox_limit {
            index = state.prox_limit;
            start = self.config.max_prox;
            down = true;
        }
        let limit = if max == 0 { usize::MAX } else { max };
        let mut served = 0;

        loop {
            for peer in self.buckets[start].peers() {
                result.push(peer, limit);
                served += 1;
            }
            let done = if max == 0 {
                start <= index && (served > 0 || start == 0)
            } else {
                down && start <= index
                    && (served >= limit || served == state.count || start == 0)
            };
            if done {
                break;
            }
            if down {
                start -= 1;
            } else if start == self.config.max_prox {
                if index == 0 {
                    break;
                }
                start = index - 1;
                down = true;
            } else {
                start += 1;
            }
        }
        trace!(%target, served, returned = result.peers.len(), "closest peers query");
        result.peers
    }

    /// Suggests the next known peer to dial, together with the lowest bin
    /// index still wanting live peers.
    pub fn find_best(&self) -> (Option<NodeRecord>, usize) {
        self.find_best_at(unix_millis_now())
    }

    /// [`find_best`](Self::find_best) with the caller's clock, for
    /// deterministic scheduling.
    pub fn find_best_at(&self, now_ms: u64) -> (Option<NodeRecord>, usize) {
        let sizes: Vec<usize> = self.buckets.iter().map(Bucket::len).collect();
        self.db
            .find_best_at(now_ms, self.config.bucket_size, move |bin| sizes[bin])
    }

    /// Adds discovered peer records to the database.
    pub fn add(&self, records: &[NodeRecord]) {
        self.db.add(records, |addr| self.proximity_bin(addr));
    }

    /// The chunk address interval `other` answers for, given the current
    /// proximity limit.
    pub fn key_range(&self, other: &OverlayAddress) -> (OverlayAddress, OverlayAddress) {
        let state = self.state.read();
        key_range(&self.base, other, state.prox_limit)
    }

    /// Persists the record database to `path`. See
    /// [`save_with`](Self::save_with).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        self.save_with(path, |_, _| {})
    }

    /// Persists the record database, letting `cb` refresh each record
    /// (e.g. stamp `last_seen` from its live peer) before it is written.
    pub fn save_with(
        &self,
        path: impl AsRef<Path>,
        cb: impl FnMut(&mut NodeRecord, Option<&Arc<P>>),
    ) -> Result<(), PersistenceError> {
        self.db.save(path.as_ref(), cb)
    }

    /// Restores the record database from `path`. See
    /// [`load_with`](Self::load_with).
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        self.load_with(path, |_| Ok(()))
    }

    /// Restores the record database from `path`; `cb` may reject
    /// individual records. Records are re-binned against this table's
    /// anchor and `max_prox`.
    pub fn load_with(
        &self,
        path: impl AsRef<Path>,
        cb: impl FnMut(&NodeRecord) -> Result<(), CallbackError>,
    ) -> Result<(), PersistenceError> {
        self.db
            .load(path.as_ref(), cb, |addr| self.proximity_bin(addr))
    }

    /// Drops cold, disconnected records. See [`HiveConfig::purge_interval`].
    pub fn purge(&self) {
        self.db.purge();
    }

    /// [`purge`](Self::purge) with the caller's clock.
    pub fn purge_at(&self, now_ms: u64) {
        self.db.purge_at(now_ms);
    }

    /// Point-in-time snapshot of table occupancy.
    pub fn stats(&self) -> HiveStats {
        let state = self.state.read();
        HiveStats {
            population: state.count,
            known: self.db.count(),
            prox_limit: state.prox_limit,
            prox_size: state.prox_size,
            bin_sizes: self.buckets.iter().map(Bucket::len).collect(),
        }
    }
}

/// Occupancy snapshot returned by [`Hive::stats`].
#[derive(Debug, Clone)]
pub struct HiveStats {
    /// Live peers resident in the table.
    pub population: usize,
    /// Known peer records in the database.
    pub known: usize,
    /// Lowest bin of the saturated neighborhood.
    pub prox_limit: usize,
    /// Live peers inside the saturated neighborhood.
    pub prox_size: usize,
    /// Live peers per bin.
    pub bin_sizes: Vec<usize>,
}

/// Result list for `find_closest`, kept ordered by distance to the target.
struct ClosestPeers<P> {
    target: OverlayAddress,
    peers: Vec<Arc<P>>,
}

impl<P: HivePeer> ClosestPeers<P> {
    fn new(target: OverlayAddress) -> Self {
        Self {
            target,
            peers: Vec::new(),
        }
    }

    /// Inserts `peer` at its sorted position, keeping at most `limit`
    /// entries and dropping the farthest when full.
    fn push(&mut self, peer: Arc<P>, limit: usize) {
        let address = peer.address();
        let at = self
            .peers
            .partition_point(|p| distance_cmp(&self.target, &p.address(), &address) == Ordering::Less);
        if self.peers.len() < limit {
            self.peers.insert(at, peer);
        } else if at < self.peers.len() {
            self.peers.pop();
            self.peers.insert(at, peer);
        }
    }
}

impl<P: HivePeer> fmt::Display for Hive<P> {
    /// Deterministic ASCII dump: one row per bin with the live count, the
    /// first peer address prefixes rotated from the record cursor, and the
    /// bin's record count, cursor and record prefixes. A marker row flags
    /// the current proximity limit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        writeln!(
            f,
            "========================================================================="
        )?;
        writeln!(
            f,
            "hive: base address {}, population: {} ({})",
            hex::encode(&self.base[..4]),
            state.count,
            self.db.count()
        )?;
        writeln!(
            f,
            "max_prox: {}, prox_bin_size: {}, bucket_size: {}, prox_limit: {}, prox_size: {}",
            self.config.max_prox,
            self.config.prox_bin_size,
            self.config.bucket_size,
            state.prox_limit,
            state.prox_size
        )?;

        for bin in 0..=self.config.max_prox {
            if bin == state.prox_limit {
                writeln!(
                    f,
                    "===================== PROX LIMIT: {bin} ====================================="
                )?;
            }
            let peers = self.buckets[bin].peers();
            let (cursor, records) = self.db.bin_snapshot(bin);

            write!(f, "{bin:03} {:2}", peers.len())?;
            for k in 0..3 {
                if k < peers.len() {
                    let peer = &peers[(cursor + k) % peers.len()];
                    write!(f, " {}", hex::encode(&peer.address()[..4]))?;
                } else {
                    write!(f, "         ")?;
                }
            }
            write!(f, " | {:2} {:2}", records.len(), cursor)?;
            for record in records.iter().take(3) {
                write!(f, " {}", hex::encode(&record.address[..4]))?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "========================================================================="
        )
    }
}
