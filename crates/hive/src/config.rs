//! Hive configuration.

use std::time::Duration;

/// Default highest proximity bin index.
pub const DEFAULT_MAX_PROX: usize = 8;

/// Default target population of the saturated neighborhood.
pub const DEFAULT_PROX_BIN_SIZE: usize = 4;

/// Default maximum live peers per bin.
pub const DEFAULT_BUCKET_SIZE: usize = 3;

/// Default eviction period for cold node records.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(42 * 60 * 60);

/// Default base unit of the reconnection backoff.
pub const DEFAULT_INITIAL_RETRY_INTERVAL: Duration = Duration::from_millis(42 * 100);

/// Default ceiling on the reconnection backoff.
pub const DEFAULT_MAX_IDLE_INTERVAL: Duration = Duration::from_secs(42 * 10);

/// Default exponential backoff base.
pub const DEFAULT_CONN_RETRY_EXP: u32 = 2;

/// Configuration for the routing table and its record database.
#[derive(Debug, Clone)]
pub struct HiveConfig {
    /// Highest proximity bin index; peers at or beyond it share the last
    /// bin.
    pub max_prox: usize,

    /// Target population of the saturated neighborhood.
    pub prox_bin_size: usize,

    /// Maximum live peers per bin.
    pub bucket_size: usize,

    /// Records not seen connected for this long are dropped by `purge`.
    pub purge_interval: Duration,

    /// Base wait between reconnection attempts to the same record.
    pub initial_retry_interval: Duration,

    /// Upper bound on the reconnection wait, however many attempts failed.
    pub max_idle_interval: Duration,

    /// Base of the exponential reconnection backoff.
    pub conn_retry_exp: u32,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            max_prox: DEFAULT_MAX_PROX,
            prox_bin_size: DEFAULT_PROX_BIN_SIZE,
            bucket_size: DEFAULT_BUCKET_SIZE,
            purge_interval: DEFAULT_PURGE_INTERVAL,
            initial_retry_interval: DEFAULT_INITIAL_RETRY_INTERVAL,
            max_idle_interval: DEFAULT_MAX_IDLE_INTERVAL,
            conn_retry_exp: DEFAULT_CONN_RETRY_EXP,
        }
    }
}

impl HiveConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the highest proximity bin index.
    pub fn with_max_prox(mut self, max_prox: usize) -> Self {
        self.max_prox = max_prox;
        self
    }

    /// Set the target saturated-neighborhood population.
    pub fn with_prox_bin_size(mut self, size: usize) -> Self {
        self.prox_bin_size = size;
        self
    }

    /// Set the per-bin live peer capacity.
    pub fn with_bucket_size(mut self, size: usize) -> Self {
        self.bucket_size = size;
        self
    }

    /// Set the cold-record eviction period.
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    /// Set the base reconnection backoff unit.
    pub fn with_initial_retry_interval(mut self, interval: Duration) -> Self {
        self.initial_retry_interval = interval;
        self
    }

    /// Set the reconnection backoff ceiling.
    pub fn with_max_idle_interval(mut self, interval: Duration) -> Self {
        self.max_idle_interval = interval;
        self
    }

    /// Set the exponential backoff base.
    pub fn with_conn_retry_exp(mut self, exp: u32) -> Self {
        self.conn_retry_exp = exp;
        self
    }
}
