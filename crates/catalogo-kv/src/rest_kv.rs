//! Client for REST key-value APIs (Upstash / Vercel KV).
//!
//! Each command is POSTed to the base URL as a JSON array, e.g.
//! `["SET", "key", "value", "EX", "300"]`, with a bearer token. Replies are
//! `{"result": ...}` on success and `{"error": "..."}` on failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{KvError, KvResult};
use crate::traits::KvStore;

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct RestKv {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestKv {
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> KvResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn command(&self, args: &[&str]) -> KvResult<Value> {
        let name = args.first().copied().unwrap_or_default();
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        let reply: RestReply = match response.json().await {
            Ok(reply) => reply,
            Err(e) if !status.is_success() => {
                return Err(KvError::Rest {
                    status: status.as_u16(),
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(KvError::unexpected(name, e.to_string())),
        };

        if let Some(message) = reply.error {
            return Err(KvError::Rest {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(KvError::Rest {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }
        Ok(reply.result.unwrap_or(Value::Null))
    }
}

fn as_integer(command: &str, value: Value) -> KvResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| KvError::unexpected(command, n.to_string())),
        Value::String(s) => s
            .parse()
            .map_err(|_| KvError::unexpected(command, s)),
        other => Err(KvError::unexpected(command, other.to_string())),
    }
}

#[async_trait]
impl KvStore for RestKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1).to_string();
                self.command(&["SET", key, value, "EX", &secs]).await?;
            }
            None => {
                self.command(&["SET", key, value]).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<()> {
        self.command(&["DEL", key]).await?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> KvResult<u64> {
        tracing::debug!(
            pattern = %pattern,
            "pattern delete not supported by REST key-value API; relying on version invalidation"
        );
        Ok(0)
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let value = self.command(&["INCR", key]).await?;
        as_integer("INCR", value)
    }

    async fn index_add(&self, key: &str, member: &str, score: i64) -> KvResult<()> {
        let score = score.to_string();
        self.command(&["ZADD", key, &score, member]).await?;
        Ok(())
    }

    async fn index_remove(&self, key: &str, member: &str) -> KvResult<()> {
        self.command(&["ZREM", key, member]).await?;
        Ok(())
    }

    async fn index_members(&self, key: &str) -> KvResult<Vec<String>> {
        match self.command(&["ZREVRANGE", key, "0", "-1"]).await? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(KvError::unexpected("ZREVRANGE", other.to_string())),
                })
                .collect(),
            other => Err(KvError::unexpected("ZREVRANGE", other.to_string())),
        }
    }

    async fn ping(&self) -> KvResult<()> {
        match self.command(&["PING"]).await? {
            Value::String(s) if s == "PONG" => Ok(()),
            other => Err(KvError::unexpected("PING", other.to_string())),
        }
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}
