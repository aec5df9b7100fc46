//! Record cache abstraction.
//!
//! The cache is the single shared mutable resource of the pipeline: a
//! key-value store with per-key time-to-live. It serves both as a
//! read-through cache for individual fundamentals records and as the source
//! of truth for the symbol universe, the persisted snapshot, and the
//! snapshot job's status/progress side-channel.
//!
//! Backends implement [`CacheStore`]; [`MemoryStore`] is the in-process
//! backend used by tests and development, the Redis backend lives in the
//! `yieldmap-storage-redis` crate.

mod memory;

pub use memory::MemoryStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::FetchError;

/// Well-known cache keys.
///
/// Symbol records are keyed by the bare upper-case symbol itself and do not
/// appear here. The cache is case-sensitive; callers normalize symbol keys.
pub mod keys {
    /// JSON array of the full symbol universe.
    pub const TICKERS: &str = "tickers";
    /// JSON array of the persisted snapshot.
    pub const SNAPSHOT: &str = "snapshot:all";
    /// Bare string form of [`JobStatus`](crate::models::JobStatus).
    pub const JOB_STATUS: &str = "snapshot:job:status";
    /// JSON [`JobProgress`](crate::models::JobProgress).
    pub const JOB_PROGRESS: &str = "snapshot:job:progress";
}

/// Time-to-live for each timed key family.
///
/// The job status and progress keys are untimed; they are overwritten
/// explicitly on every transition.
pub mod ttl {
    use std::time::Duration;

    /// Symbol universe: two weeks.
    pub const TICKERS: Duration = Duration::from_secs(1_209_600);
    /// Single-symbol fundamentals record: one hour.
    pub const FUNDAMENTALS: Duration = Duration::from_secs(3_600);
    /// Full snapshot: 24 hours.
    pub const SNAPSHOT: Duration = Duration::from_secs(86_400);
}

/// Key-value store with per-key time-to-live.
///
/// Failures of the underlying store surface as
/// [`FetchError::Unavailable`] and are always propagated - callers decide
/// whether to fall back. A `set` always overwrites regardless of prior
/// content; there is no invalidation beyond expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a key. Returns `None` for absent or expired entries.
    async fn get(&self, key: &str) -> Result<Option<String>, FetchError>;

    /// Write a key, replacing any prior value. `ttl = None` stores the
    /// entry without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), FetchError>;
}
