//! Read-through and batch fundamentals fetching.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{ttl, CacheStore};
use crate::errors::FetchError;
use crate::models::FundamentalsRecord;
use crate::provider::FundamentalsSource;

/// Pacing delay inserted between batch windows.
const WINDOW_PACING: Duration = Duration::from_secs(1);

/// Read-through fetch service for fundamentals records.
///
/// Single-symbol fetches consult the cache first and fall back to the
/// external source on a miss; batch fetches fan out over bounded windows.
/// The service holds its collaborators behind trait objects so tests can
/// substitute both the store and the source.
#[derive(Clone)]
pub struct FundamentalsService {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn FundamentalsSource>,
}

impl FundamentalsService {
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn FundamentalsSource>) -> Self {
        Self { store, source }
    }

    /// Fetch fundamentals for one symbol through the cache.
    ///
    /// The symbol is upper-cased before lookup, so a cached record never
    /// issues an external call regardless of input casing. A cache read
    /// failure is propagated to the caller; a write-back failure after a
    /// successful fetch is only logged and the record is still returned,
    /// since the data in hand is good.
    pub async fn fetch(&self, symbol: &str) -> Result<FundamentalsRecord, FetchError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(FetchError::Validation {
                status: None,
                message: "Symbol must not be empty".to_string(),
            });
        }

        if let Some(cached) = self.store.get(&symbol).await? {
            match serde_json::from_str(&cached) {
                Ok(record) => {
                    debug!("Cache hit for {}", symbol);
                    return Ok(record);
                }
                // An undecodable entry is treated as a miss and refetched.
                Err(e) => warn!("Discarding undecodable cache entry for {}: {}", symbol, e),
            }
        }

        let record = self.source.fundamentals(&symbol).await?;

        match serde_json::to_string(&record) {
            Ok(payload) => {
                if let Err(e) = self
                    .store
                    .set(&symbol, &payload, Some(ttl::FUNDAMENTALS))
                    .await
                {
                    warn!("Failed to cache fundamentals for {}: {}", symbol, e);
                }
            }
            Err(e) => warn!("Failed to encode fundamentals for {}: {}", symbol, e),
        }

        Ok(record)
    }

    /// Fetch a set of symbols in consecutive windows of `width`.
    ///
    /// All fetches within a window run concurrently, each going through the
    /// single-symbol cache path; windows execute strictly sequentially with
    /// a fixed pacing delay between them, and no delay after the final
    /// window. Per-symbol failures land in the result map as errors and
    /// never abort the batch or other in-flight symbols.
    pub async fn fetch_batch(
        &self,
        symbols: &[String],
        width: usize,
    ) -> HashMap<String, Result<FundamentalsRecord, FetchError>> {
        let width = width.max(1);
        let mut results = HashMap::with_capacity(symbols.len());

        let chunks: Vec<&[String]> = symbols.chunks(width).collect();
        let windows = chunks.len();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let fetches: Vec<_> = chunk
                .iter()
                .map(|symbol| async move { (symbol.clone(), self.fetch(symbol).await) })
                .collect();

            for (symbol, result) in futures::future::join_all(fetches).await {
                results.insert(symbol, result);
            }

            if index + 1 < windows {
                tokio::time::sleep(WINDOW_PACING).await;
            }
        }

        results
    }
}
