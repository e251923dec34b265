//! In-process key-value store.
//!
//! Used when no shared backend is configured. State lives in one process
//! only, so multiple server instances each see their own counters and
//! indexes. Development use only.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{KvError, KvResult};
use crate::traits::KvStore;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Index(SortedIndex),
}

#[derive(Debug, Clone, Default)]
struct SortedIndex {
    scores: HashMap<String, i64>,
    ordered: BTreeSet<(i64, String)>,
}

impl SortedIndex {
    fn insert(&mut self, member: &str, score: i64) {
        if let Some(previous) = self.scores.insert(member.to_string(), score) {
            self.ordered.remove(&(previous, member.to_string()));
        }
        self.ordered.insert((score, member.to_string()));
    }

    fn remove(&mut self, member: &str) {
        if let Some(score) = self.scores.remove(member) {
            self.ordered.remove(&(score, member.to_string()));
        }
    }

    fn descending(&self) -> Vec<String> {
        self.ordered.iter().rev().map(|(_, m)| m.clone()).collect()
    }

    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[derive(Debug, Clone)]
struct StoredValue {
    value: Value,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// `DashMap`-backed store with lazy expiry: an expired key is removed the
/// next time it is touched.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<DashMap<String, StoredValue>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held, including expired keys not yet touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let expired = match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                return match &entry.value {
                    Value::Text(text) => Ok(Some(text.clone())),
                    Value::Index(_) => Err(KvError::wrong_type(key)),
                };
            }
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        self.entries.insert(
            key.to_string(),
            StoredValue::new(Value::Text(value.to_string()), ttl),
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> KvResult<u64> {
        let matcher = glob::Pattern::new(pattern).map_err(|e| KvError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matcher.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        match self.entries.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(StoredValue::new(Value::Text("1".to_string()), None));
                Ok(1)
            }
            Entry::Occupied(mut slot) => {
                if slot.get().is_expired() {
                    slot.insert(StoredValue::new(Value::Text("1".to_string()), None));
                    return Ok(1);
                }
                let stored = slot.get_mut();
                let Value::Text(text) = &mut stored.value else {
                    return Err(KvError::wrong_type(key));
                };
                let current: i64 = text.parse().map_err(|_| KvError::NotAnInteger {
                    key: key.to_string(),
                })?;
                let next = current + 1;
                *text = next.to_string();
                Ok(next)
            }
        }
    }

    async fn index_add(&self, key: &str, member: &str, score: i64) -> KvResult<()> {
        let mut slot = self.entries.entry(key.to_string()).or_insert_with(|| {
            StoredValue::new(Value::Index(SortedIndex::default()), None)
        });
        if slot.is_expired() {
            *slot = StoredValue::new(Value::Index(SortedIndex::default()), None);
        }
        match &mut slot.value {
            Value::Index(index) => {
                index.insert(member, score);
                Ok(())
            }
            Value::Text(_) => Err(KvError::wrong_type(key)),
        }
    }

    async fn index_remove(&self, key: &str, member: &str) -> KvResult<()> {
        let now_empty = match self.entries.get_mut(key) {
            None => return Ok(()),
            Some(mut slot) => match &mut slot.value {
                Value::Index(index) => {
                    index.remove(member);
                    index.is_empty()
                }
                Value::Text(_) => return Err(KvError::wrong_type(key)),
            },
        };
        if now_empty {
            self.entries.remove_if(key, |_, stored| {
                matches!(&stored.value, Value::Index(index) if index.is_empty())
            });
        }
        Ok(())
    }

    async fn index_members(&self, key: &str) -> KvResult<Vec<String>> {
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(slot) if slot.is_expired() => Ok(Vec::new()),
            Some(slot) => match &slot.value {
                Value::Index(index) => Ok(index.descending()),
                Value::Text(_) => Err(KvError::wrong_type(key)),
            },
        }
    }

    async fn ping(&self) -> KvResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("a").await.unwrap(), None);

        kv.set("a", "1", None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("1"));

        kv.set("a", "2", None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("2"));

        kv.delete("a").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lazy_expiry_removes_entry() {
        let kv = MemoryKv::new();
        kv.set("short", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(kv.get("short").await.unwrap().is_some());
        assert_eq!(kv.len(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(kv.get("short").await.unwrap(), None);
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_incr_starts_at_one_and_is_atomic() {
        let kv = MemoryKv::new();
        assert_eq!(kv.incr("counter").await.unwrap(), 1);
        assert_eq!(kv.incr("counter").await.unwrap(), 2);

        let mut handles = Vec::new();
        for _ in 0..50 {
            let kv = kv.clone();
            handles.push(tokio::spawn(async move { kv.incr("counter").await.unwrap() }));
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (3..=52).collect::<Vec<i64>>());
        assert_eq!(kv.get("counter").await.unwrap().as_deref(), Some("52"));
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let kv = MemoryKv::new();
        kv.set("word", "hello", None).await.unwrap();
        assert!(matches!(
            kv.incr("word").await,
            Err(KvError::NotAnInteger { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let kv = MemoryKv::new();
        kv.set("veiculos:list:v1:a", "x", None).await.unwrap();
        kv.set("veiculos:list:v1:b", "x", None).await.unwrap();
        kv.set("veiculos:version", "1", None).await.unwrap();

        let removed = kv.delete_pattern("veiculos:list:*").await.unwrap();
        assert_eq!(removed, 2);
        assert!(kv.get("veiculos:version").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_index_order_and_replace() {
        let kv = MemoryKv::new();
        kv.index_add("idx", "a", 10).await.unwrap();
        kv.index_add("idx", "b", 30).await.unwrap();
        kv.index_add("idx", "c", 20).await.unwrap();
        kv.index_add("idx", "d", 20).await.unwrap();
        assert_eq!(kv.index_members("idx").await.unwrap(), vec!["b", "d", "c", "a"]);

        kv.index_add("idx", "a", 40).await.unwrap();
        assert_eq!(kv.index_members("idx").await.unwrap()[0], "a");
        assert_eq!(kv.index_members("idx").await.unwrap().len(), 4);

        kv.index_remove("idx", "a").await.unwrap();
        kv.index_remove("idx", "missing").await.unwrap();
        assert_eq!(kv.index_members("idx").await.unwrap(), vec!["b", "d", "c"]);
    }

    #[tokio::test]
    async fn test_index_concurrent_adds_are_not_lost() {
        let kv = MemoryKv::new();
        let mut handles = Vec::new();
        for i in 0..100 {
            let kv = kv.clone();
            handles.push(tokio::spawn(async move {
                kv.index_add("idx", &format!("m{i:03}"), i).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(kv.index_members("idx").await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let kv = MemoryKv::new();
        kv.index_add("idx", "a", 1).await.unwrap();
        assert!(matches!(kv.get("idx").await, Err(KvError::WrongType { .. })));
        kv.set("text", "v", None).await.unwrap();
        assert!(matches!(
            kv.index_add("text", "a", 1).await,
            Err(KvError::WrongType { .. })
        ));
    }
}
