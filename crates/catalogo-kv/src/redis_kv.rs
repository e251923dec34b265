use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

use crate::config::KvConfig;
use crate::error::{KvError, KvResult};
use crate::traits::KvStore;

const SCAN_BATCH: usize = 200;

/// Redis-backed store over a `deadpool-redis` connection pool.
#[derive(Clone)]
pub struct RedisKv {
    pool: Pool,
}

impl RedisKv {
    /// Builds a pool for `url` sized and timed from `config`. No connection
    /// is opened until the first command.
    pub fn connect(url: &str, config: &KvConfig) -> KvResult<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut redis_config = Config::from_url(url);
        let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        redis_config.pool = Some(pool_config);

        let pool = redis_config.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> KvResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl KvStore for RedisKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        let mut conn = self.conn().await?;
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value, secs).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> KvResult<u64> {
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut removed = 0u64;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        tracing::debug!(pattern = %pattern, removed, "deleted keys by pattern");
        Ok(removed)
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let mut conn = self.conn().await?;
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn index_add(&self, key: &str, member: &str, score: i64) -> KvResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    async fn index_remove(&self, key: &str, member: &str) -> KvResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.zrem(key, member).await?;
        Ok(())
    }

    async fn index_members(&self, key: &str) -> KvResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let members: Vec<String> = conn.zrevrange(key, 0, -1).await?;
        Ok(members)
    }

    async fn ping(&self) -> KvResult<()> {
        let mut conn = self.conn().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(KvError::unexpected("PING", pong));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
