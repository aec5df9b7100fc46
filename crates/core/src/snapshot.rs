//! Snapshot job orchestration.
//!
//! A snapshot run walks the cached symbol universe, fetches fundamentals
//! for each symbol through the read-through cache, and persists the
//! records with a positive dividend yield as one replaceable snapshot
//! document. Job status and progress live in the cache so any process
//! sharing the store can observe or cancel a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::cache::{keys, ttl, CacheStore};
use crate::errors::FetchError;
use crate::fundamentals::FundamentalsService;
use crate::models::{FundamentalsRecord, JobProgress, JobStatus};

/// Progress is checkpointed after every this many processed symbols.
const CHECKPOINT_EVERY: usize = 50;

/// How a snapshot run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunOutcome {
    /// Every symbol in the universe was processed.
    Completed {
        completed: usize,
        failed: usize,
        kept: usize,
    },
    /// The run observed a cancellation and stopped early.
    Cancelled { completed: usize },
}

/// Coordinates snapshot runs over the shared cache.
///
/// Exactly one run is active per service instance at a time: `trigger`
/// consults the cached job status and an in-process guard before spawning,
/// so repeated triggers while a run is active are cheap no-ops.
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn CacheStore>,
    fundamentals: Arc<FundamentalsService>,
    requests_per_minute: u32,
    run_active: Arc<AtomicBool>,
}

impl SnapshotService {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fundamentals: Arc<FundamentalsService>,
        requests_per_minute: u32,
    ) -> Self {
        Self {
            store,
            fundamentals,
            requests_per_minute: requests_per_minute.max(1),
            run_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a snapshot run in the background.
    ///
    /// A trigger while a run is already active is a no-op. Failures inside
    /// the spawned run are recorded as a `Failed` job status; the trigger
    /// itself only fails when the status read does.
    pub async fn trigger(&self) -> Result<(), FetchError> {
        if self.status().await? == JobStatus::Running {
            info!("Snapshot job already running, ignoring trigger");
            return Ok(());
        }
        if self
            .run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Snapshot job already starting, ignoring trigger");
            return Ok(());
        }

        let service = self.clone();
        tokio::spawn(async move {
            match service.run().await {
                Ok(RunOutcome::Completed {
                    completed,
                    failed,
                    kept,
                }) => {
                    info!(
                        "Snapshot run finished: {} processed, {} failed, {} kept",
                        completed, failed, kept
                    );
                }
                Ok(RunOutcome::Cancelled { completed }) => {
                    info!("Snapshot run cancelled after {} symbols", completed);
                }
                Err(e) => {
                    error!("Snapshot run failed: {}", e);
                    if let Err(e) = service
                        .store
                        .set(keys::JOB_STATUS, JobStatus::Failed.as_str(), None)
                        .await
                    {
                        warn!("Failed to record failed job status: {}", e);
                    }
                }
            }
            service.run_active.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// Drive one full snapshot pass. `trigger` is the spawning entry point;
    /// this is exposed to the crate so tests can run the job to completion
    /// in the foreground.
    pub(crate) async fn run(&self) -> Result<RunOutcome, FetchError> {
        // The universe must already be cached; the job never refreshes it.
        let symbols = self.load_universe().await?;
        let total = symbols.len();

        self.store
            .set(keys::JOB_STATUS, JobStatus::Running.as_str(), None)
            .await?;

        let mut progress = JobProgress {
            completed: 0,
            total,
            started_at: Utc::now(),
            estimated_minutes_remaining: estimate_minutes(total, self.requests_per_minute),
        };
        self.write_progress(&progress).await?;

        info!("Snapshot run started over {} symbols", total);

        let mut kept: Vec<FundamentalsRecord> = Vec::new();
        let mut completed = 0usize;
        let mut failed = 0usize;

        for symbol in &symbols {
            // Cooperative cancellation: any other writer flipping the status
            // away from Running stops the run before its next fetch.
            if self.status().await? != JobStatus::Running {
                info!(
                    "Snapshot run cancelled after {} of {} symbols",
                    completed, total
                );
                return Ok(RunOutcome::Cancelled { completed });
            }

            match self.fundamentals.fetch(symbol).await {
                Ok(record) => {
                    if record.dividend_yield_percent > 0.0 {
                        kept.push(record);
                    }
                }
                // A cache outage is fatal; anything else skips the symbol.
                Err(e @ FetchError::Unavailable { .. }) => return Err(e),
                Err(e) => {
                    warn!("Skipping {}: {}", symbol, e);
                    failed += 1;
                }
            }
            completed += 1;

            if completed % CHECKPOINT_EVERY == 0 || completed == total {
                progress.completed = completed;
                progress.estimated_minutes_remaining = estimate_minutes(
                    total.saturating_sub(completed + failed),
                    self.requests_per_minute,
                );
                self.write_progress(&progress).await?;
            }

            tokio::time::sleep(self.pacing_interval()).await;
        }

        let payload = serde_json::to_string(&kept).map_err(|e| FetchError::Validation {
            status: None,
            message: format!("Failed to encode snapshot: {}", e),
        })?;
        self.store
            .set(keys::SNAPSHOT, &payload, Some(ttl::SNAPSHOT))
            .await?;
        self.store
            .set(keys::JOB_STATUS, JobStatus::Idle.as_str(), None)
            .await?;

        info!(
            "Snapshot run finished: kept {} of {} symbols, {} failed",
            kept.len(),
            total,
            failed
        );

        Ok(RunOutcome::Completed {
            completed,
            failed,
            kept: kept.len(),
        })
    }

    /// Request cancellation of an active run.
    ///
    /// Only a `Running` job transitions back to `Idle`; any other status is
    /// left untouched. The running loop observes the change before its next
    /// fetch and stops without writing a snapshot.
    pub async fn cancel(&self) -> Result<(), FetchError> {
        if self.status().await? == JobStatus::Running {
            self.store
                .set(keys::JOB_STATUS, JobStatus::Idle.as_str(), None)
                .await?;
            info!("Snapshot job cancellation requested");
        } else {
            info!("No snapshot job running, nothing to cancel");
        }
        Ok(())
    }

    /// Current job status as recorded in the cache.
    pub async fn status(&self) -> Result<JobStatus, FetchError> {
        let raw = self.store.get(keys::JOB_STATUS).await?;
        Ok(JobStatus::from_stored(raw.as_deref()))
    }

    /// Last checkpointed progress, if any run has recorded one.
    pub async fn progress(&self) -> Result<Option<JobProgress>, FetchError> {
        match self.store.get(keys::JOB_PROGRESS).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(progress) => Ok(Some(progress)),
                Err(e) => {
                    warn!("Discarding undecodable job progress: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// The most recently persisted snapshot, if one exists.
    pub async fn snapshot(&self) -> Result<Option<Vec<FundamentalsRecord>>, FetchError> {
        match self.store.get(keys::SNAPSHOT).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(records) => Ok(Some(records)),
                Err(e) => {
                    warn!("Discarding undecodable snapshot: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn load_universe(&self) -> Result<Vec<String>, FetchError> {
        let raw = self
            .store
            .get(keys::TICKERS)
            .await?
            .ok_or_else(|| FetchError::Validation {
                status: None,
                message: "Symbol universe is not cached".to_string(),
            })?;

        serde_json::from_str(&raw).map_err(|e| FetchError::Validation {
            status: None,
            message: format!("Failed to decode symbol universe: {}", e),
        })
    }

    async fn write_progress(&self, progress: &JobProgress) -> Result<(), FetchError> {
        let payload = serde_json::to_string(progress).map_err(|e| FetchError::Validation {
            status: None,
            message: format!("Failed to encode job progress: {}", e),
        })?;
        self.store.set(keys::JOB_PROGRESS, &payload, None).await
    }

    /// Delay between consecutive symbol fetches, derived from the
    /// configured request rate.
    fn pacing_interval(&self) -> Duration {
        let rpm = u64::from(self.requests_per_minute);
        Duration::from_millis((60_000 + rpm - 1) / rpm)
    }
}

/// Whole minutes needed to process `remaining` symbols at `rate` requests
/// per minute, rounded up.
fn estimate_minutes(remaining: usize, rate: u32) -> u64 {
    let rate = u64::from(rate.max(1));
    let remaining = remaining as u64;
    (remaining + rate - 1) / rate
}
