//! Persistent TTL cache for API responses.
//!
//! Values survive restarts, which matters for the daily-quota RapidAPI
//! provider. Expiry uses wall-clock epoch seconds so entries written by a
//! previous process stay valid.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::common::error::{StatsError, StoreError};
use crate::store::{atomic_write, read_json_or_empty};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    expires_at: f64,
    value: Value,
}

type CacheMap = HashMap<String, CacheEntry>;

/// A string-keyed TTL cache of JSON values, persisted to disk.
pub struct ResponseCache {
    path: PathBuf,
    state: Mutex<Option<CacheMap>>,
}

impl ResponseCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("api_cache.json"),
            state: Mutex::new(None),
        }
    }

    /// Return the cached value for `key`, or run `fetch` and store its
    /// result with the given TTL.
    ///
    /// The lock is not held across the fetch, so a concurrent miss on the
    /// same key may fetch twice; the second write wins and both callers get
    /// a consistent value.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Value, StatsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, StatsError>>,
    {
        if let Some(value) = self.get(key).await {
            debug!("cache hit: {}", key);
            return Ok(value);
        }

        debug!("cache miss: {} - calling API", key);
        let value = fetch().await?;
        if let Err(e) = self.set(key, value.clone(), ttl).await {
            // A failed save only costs us the caching, not the reply.
            tracing::warn!("Failed to persist cache entry '{}': {}", key, e);
        }
        Ok(value)
    }

    /// Get a live entry, dropping it if expired.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = epoch_now();
        let mut state = self.state.lock().await;
        let map = self.ensure_loaded(&mut state).await;

        match map.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value with the given TTL.
    pub async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let map = self.ensure_loaded(&mut state).await;
        map.insert(
            key.to_string(),
            CacheEntry {
                expires_at: epoch_now() + ttl.as_secs_f64(),
                value,
            },
        );
        let content = serde_json::to_string_pretty(map)?;
        atomic_write(&self.path, &content).await
    }

    async fn ensure_loaded<'a>(&self, state: &'a mut Option<CacheMap>) -> &'a mut CacheMap {
        if state.is_none() {
            let mut map: CacheMap = read_json_or_empty(&self.path).await.unwrap_or_default();
            // Drop entries that expired while the process was down.
            let now = epoch_now();
            map.retain(|_, entry| entry.expires_at > now);
            *state = Some(map);
        }
        state.as_mut().unwrap()
    }
}

fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());

        let value = cache
            .get_or_fetch("k", Duration::from_secs(60), || async {
                Ok(json!({"n": 1}))
            })
            .await
            .unwrap();
        assert_eq!(value, json!({"n": 1}));

        // Second call must not invoke the fetch closure.
        use std::sync::atomic::{AtomicBool, Ordering};
        let called = AtomicBool::new(false);
        let value = cache
            .get_or_fetch("k", Duration::from_secs(60), || async {
                called.store(true, Ordering::SeqCst);
                Ok(json!({"n": 2}))
            })
            .await
            .unwrap();
        assert_eq!(value, json!({"n": 1}));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());

        cache.set("k", json!(1), Duration::ZERO).await.unwrap();

        let value = cache
            .get_or_fetch("k", Duration::from_secs(60), || async { Ok(json!(2)) })
            .await
            .unwrap();
        assert_eq!(value, json!(2));
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());

        let result = cache
            .get_or_fetch("k", Duration::from_secs(60), || async {
                Err(StatsError::Timeout)
            })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        {
            let cache = ResponseCache::new(dir.path());
            cache
                .set("k", json!("saved"), Duration::from_secs(3600))
                .await
                .unwrap();
        }

        let reopened = ResponseCache::new(dir.path());
        assert_eq!(reopened.get("k").await, Some(json!("saved")));
    }
}
