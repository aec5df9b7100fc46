//! Symbol universe maintenance.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{keys, ttl, CacheStore};
use crate::errors::FetchError;
use crate::provider::SymbolUniverseSource;

/// Maintains the cached symbol universe that snapshot runs iterate.
///
/// The snapshot job only ever reads the cached universe and fails when it
/// is absent; populating or refreshing it is an explicit, caller-driven
/// operation handled here.
#[derive(Clone)]
pub struct UniverseService {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn SymbolUniverseSource>,
}

impl UniverseService {
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn SymbolUniverseSource>) -> Self {
        Self { store, source }
    }

    /// Return the cached universe, fetching and caching it on a miss.
    pub async fn tickers(&self) -> Result<Vec<String>, FetchError> {
        if let Some(raw) = self.store.get(keys::TICKERS).await? {
            match serde_json::from_str(&raw) {
                Ok(symbols) => return Ok(symbols),
                Err(e) => warn!("Discarding undecodable symbol universe: {}", e),
            }
        }
        self.refresh().await
    }

    /// Fetch the universe from the source and replace the cached copy.
    ///
    /// The cache write is not best-effort here: a universe that failed to
    /// persist would leave later snapshot runs without input, so a store
    /// failure is propagated.
    pub async fn refresh(&self) -> Result<Vec<String>, FetchError> {
        let symbols = self.source.active_symbols().await?;

        let payload = serde_json::to_string(&symbols).map_err(|e| FetchError::Validation {
            status: None,
            message: format!("Failed to encode symbol universe: {}", e),
        })?;
        self.store
            .set(keys::TICKERS, &payload, Some(ttl::TICKERS))
            .await?;

        info!("Cached symbol universe with {} entries", symbols.len());
        Ok(symbols)
    }
}
