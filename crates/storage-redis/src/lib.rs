//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::RedisError;
use tracing::debug;

use yieldmap_core::cache::CacheStore;
use yieldmap_core::errors::FetchError;

/// [`CacheStore`] backed by a shared Redis connection.
///
/// The connection manager reconnects on its own, so one store can be cloned
/// freely across services. Every Redis failure maps to
/// [`FetchError::Unavailable`]; callers see a cache outage, never a
/// backend-specific error type.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect to the given Redis endpoint.
    pub async fn connect(url: &str) -> Result<Self, FetchError> {
        let client = redis::Client::open(url).map_err(to_unavailable)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(to_unavailable)?;
        debug!("Connected to Redis at {}", url);
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FetchError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(to_unavailable)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), FetchError> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => redis::cmd("SETEX")
                .arg(key)
                .arg(ttl.as_secs())
                .arg(value)
                .query_async(&mut conn)
                .await
                .map_err(to_unavailable),
            None => redis::cmd("SET")
                .arg(key)
                .arg(value)
                .query_async(&mut conn)
                .await
                .map_err(to_unavailable),
        }
    }
}

fn to_unavailable(e: RedisError) -> FetchError {
    FetchError::Unavailable {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_errors_map_to_unavailable() {
        let redis_err = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));

        let err = to_unavailable(redis_err);
        match err {
            FetchError::Unavailable { message } => {
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_urls() {
        let err = RedisStore::connect("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Unavailable { .. }));
    }
}
