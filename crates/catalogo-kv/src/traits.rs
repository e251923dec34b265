use std::time::Duration;

use async_trait::async_trait;

use crate::error::KvResult;

/// A shared key-value store.
///
/// Besides plain string values, every backend offers an atomic counter
/// (`incr`) and a sorted index (`index_*`) with Redis sorted-set semantics:
/// members are unique, re-adding a member replaces its score, and
/// [`KvStore::index_members`] lists by score descending with equal scores
/// ordered by member descending.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads a string value. Expired and missing keys are `None`.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Writes a string value, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()>;

    async fn delete(&self, key: &str) -> KvResult<()>;

    /// Deletes every key matching a glob pattern and returns how many were
    /// removed. Best effort: backends without key scanning return `Ok(0)`.
    async fn delete_pattern(&self, pattern: &str) -> KvResult<u64>;

    /// Atomically increments an integer counter, starting from 0 when absent.
    async fn incr(&self, key: &str) -> KvResult<i64>;

    async fn index_add(&self, key: &str, member: &str, score: i64) -> KvResult<()>;

    async fn index_remove(&self, key: &str, member: &str) -> KvResult<()>;

    async fn index_members(&self, key: &str) -> KvResult<Vec<String>>;

    /// Round trip to the backend.
    async fn ping(&self) -> KvResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Shared key-value store trait object.
pub type DynKvStore = std::sync::Arc<dyn KvStore>;
