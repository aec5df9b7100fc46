//! Yieldmap Core Crate
//!
//! This crate provides the resilient fetch pipeline behind the dividend
//! yield snapshot service.
//!
//! # Overview
//!
//! The core crate supports:
//! - Retrying HTTP fetches with exponential backoff and rate-limit awareness
//! - Read-through caching of fundamentals records behind a pluggable store
//! - Windowed concurrent batch fetching with per-symbol error isolation
//! - A cancellable snapshot job over the cached symbol universe
//!
//! # Architecture
//!
//! ```text
//! +------------------+      +------------------+
//! | SnapshotService  | ---> | JobStatus /      |  (cache-backed job state)
//! | (sequential job) |      | JobProgress      |
//! +------------------+      +------------------+
//!          |
//!          v
//! +---------------------+   +------------------+
//! | FundamentalsService |-->|    CacheStore    |  (read-through cache)
//! | (single + batch)    |   +------------------+
//! +---------------------+
//!          |
//!          v
//! +---------------------+
//! | FundamentalsSource  |  (Alpha Vantage)
//! +---------------------+
//!          |
//!          v
//! +---------------------+
//! |      ApiClient      |  (timeout, classification, backoff)
//! +---------------------+
//! ```
//!
//! # Core Types
//!
//! - [`FundamentalsRecord`] - One symbol's dividend fundamentals
//! - [`FetchError`] - Closed error taxonomy shared by the whole pipeline
//! - [`CacheStore`] - Pluggable cache backend seam
//! - [`FundamentalsService`] - Cached single-symbol and batch fetching
//! - [`SnapshotService`] - Snapshot job orchestration and queries
//! - [`UniverseService`] - Symbol universe loading and refresh

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod fundamentals;
pub mod models;
pub mod provider;
pub mod snapshot;
pub mod universe;

// Re-export the error taxonomy
pub use errors::{ErrorBody, ErrorKind, FetchError, RetryClass};

// Re-export model types
pub use models::{parse_yield, FundamentalsRecord, JobProgress, JobStatus, Sector};

// Re-export cache and client building blocks
pub use cache::{CacheStore, MemoryStore};
pub use client::{ApiClient, RetryPolicy};

// Re-export provider types
pub use provider::{AlphaVantageSource, FundamentalsSource, SymbolUniverseSource};

// Re-export service types
pub use config::{Config, ConfigError};
pub use fundamentals::FundamentalsService;
pub use snapshot::{RunOutcome, SnapshotService};
pub use universe::UniverseService;
