//! Failure-absorbing cache backend.

use std::future::Future;
use std::time::Duration;

use catalogo_kv::{DynKvStore, KvResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Cache facade used by the listing service.
///
/// Each call is bounded by `op_timeout`. Errors and timeouts are logged at
/// `warn` and degraded: reads become misses, writes become no-ops. Nothing
/// here returns an error to the caller.
#[derive(Clone)]
pub struct CacheBackend {
    store: DynKvStore,
    op_timeout: Duration,
}

impl CacheBackend {
    pub fn new(store: DynKvStore, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn store(&self) -> &DynKvStore {
        &self.store
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        key: &str,
        fut: impl Future<Output = KvResult<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(op, key = %key, error = %e, "cache operation failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    op,
                    key = %key,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "cache operation timed out"
                );
                None
            }
        }
    }

    /// Reads and decodes a JSON value. Undecodable entries are misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.bounded("get", key, self.store.get(key)).await??;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to encode cache entry");
                return;
            }
        };
        if self
            .bounded("set", key, self.store.set(key, &raw, Some(ttl)))
            .await
            .is_some()
        {
            tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set");
        }
    }

    pub async fn delete(&self, key: &str) {
        self.bounded("delete", key, self.store.delete(key)).await;
    }

    /// Removes keys matching `pattern`; `0` when the backend cannot.
    pub async fn delete_pattern(&self, pattern: &str) -> u64 {
        self.bounded("delete_pattern", pattern, self.store.delete_pattern(pattern))
            .await
            .unwrap_or(0)
    }

    /// Atomically increments a counter. `None` if the store is unavailable.
    pub async fn increment(&self, key: &str) -> Option<i64> {
        self.bounded("incr", key, self.store.incr(key)).await
    }

    /// Reads a counter, with `default` for an absent key. `None` if the
    /// store is unavailable or the value is not an integer.
    pub async fn read_counter(&self, key: &str, default: i64) -> Option<i64> {
        match self.bounded("get", key, self.store.get(key)).await? {
            None => Some(default),
            Some(raw) => match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(key = %key, value = %raw, "counter is not an integer");
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalogo_kv::{KvError, KvStore, MemoryKv};
    use std::sync::Arc;

    /// Store whose every call hangs past any reasonable timeout.
    struct StalledKv;

    #[async_trait]
    impl KvStore for StalledKv {
        async fn get(&self, _key: &str) -> KvResult<Option<String>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> KvResult<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
        async fn delete(&self, _key: &str) -> KvResult<()> {
            Ok(())
        }
        async fn delete_pattern(&self, _pattern: &str) -> KvResult<u64> {
            Err(KvError::Pool("stalled".into()))
        }
        async fn incr(&self, _key: &str) -> KvResult<i64> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(1)
        }
        async fn index_add(&self, _key: &str, _member: &str, _score: i64) -> KvResult<()> {
            Ok(())
        }
        async fn index_remove(&self, _key: &str, _member: &str) -> KvResult<()> {
            Ok(())
        }
        async fn index_members(&self, _key: &str) -> KvResult<Vec<String>> {
            Ok(Vec::new())
        }
        async fn ping(&self) -> KvResult<()> {
            Ok(())
        }
        fn backend_name(&self) -> &'static str {
            "stalled"
        }
    }

    fn memory() -> CacheBackend {
        CacheBackend::new(Arc::new(MemoryKv::new()), Duration::from_millis(250))
    }

    #[tokio::test]
    async fn test_json_roundtrip_and_delete() {
        let cache = memory();
        cache
            .set_json("k", &vec![1, 2, 3], Duration::from_secs(60))
            .await;
        assert_eq!(cache.get_json::<Vec<i32>>("k").await, Some(vec![1, 2, 3]));
        cache.delete("k").await;
        assert_eq!(cache.get_json::<Vec<i32>>("k").await, None);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = memory();
        cache
            .store()
            .set("k", "not json", None)
            .await
            .unwrap();
        assert_eq!(cache.get_json::<Vec<i32>>("k").await, None);
    }

    #[tokio::test]
    async fn test_counter() {
        let cache = memory();
        assert_eq!(cache.read_counter("v", 1).await, Some(1));
        assert_eq!(cache.increment("v").await, Some(1));
        assert_eq!(cache.increment("v").await, Some(2));
        assert_eq!(cache.read_counter("v", 1).await, Some(2));

        cache.store().set("bad", "x", None).await.unwrap();
        assert_eq!(cache.read_counter("bad", 1).await, None);
    }

    #[tokio::test]
    async fn test_timeouts_degrade() {
        let cache = CacheBackend::new(Arc::new(StalledKv), Duration::from_millis(20));
        assert_eq!(cache.get_json::<String>("k").await, None);
        cache.set_json("k", &"v", Duration::from_secs(1)).await;
        assert_eq!(cache.increment("v").await, None);
        assert_eq!(cache.read_counter("v", 1).await, None);
        assert_eq!(cache.delete_pattern("*").await, 0);
    }
}
