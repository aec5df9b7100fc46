//! In-process cache backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::warn;

use super::CacheStore;
use crate::errors::FetchError;

#[derive(Debug)]
struct Entry {
    value: String,
    /// Expiry deadline; `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-memory [`CacheStore`] backend.
///
/// Expiry is advisory and lazy: entries are only checked (and dropped) on
/// read, mirroring the behavior callers see from a networked store. Used by
/// tests and single-process development setups; this backend never reports
/// [`FetchError::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the entry map, recovering from poison if necessary.
    ///
    /// The map holds plain cache data, so the worst case after a panic in
    /// another thread is a stale entry, which the TTL already tolerates.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("memory store mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FetchError> {
        let mut entries = self.lock_entries();

        if let Some(entry) = entries.get(key) {
            if entry.is_expired(Instant::now()) {
                entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), FetchError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };

        let mut entries = self.lock_entries();
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_what_was_set() {
        let store = MemoryStore::new();
        store.set("AAPL", "{\"x\":1}", None).await.unwrap();
        assert_eq!(store.get("AAPL").await.unwrap(), Some("{\"x\":1}".to_string()));
    }

    #[tokio::test]
    async fn test_absent_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_prior_value() {
        let store = MemoryStore::new();
        store.set("k", "old", None).await.unwrap();
        store.set("k", "new", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_none() {
        let store = MemoryStore::new();
        store
            .set("k", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_untimed_entry_does_not_expire() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_keys_are_case_sensitive() {
        let store = MemoryStore::new();
        store.set("AAPL", "upper", None).await.unwrap();
        assert_eq!(store.get("aapl").await.unwrap(), None);
    }
}
