use serde::{Deserialize, Serialize};

/// Key-value backend selection.
///
/// Precedence: `redis_url`, then `rest_url` + `rest_token`, then the
/// in-process store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvConfig {
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub rest_url: Option<String>,
    #[serde(default)]
    pub rest_token: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_pool_size() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    2000
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            rest_url: None,
            rest_token: None,
            pool_size: default_pool_size(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl KvConfig {
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn with_rest(mut self, url: impl Into<String>, token: impl Into<String>) -> Self {
        self.rest_url = Some(url.into());
        self.rest_token = Some(token.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 {
            return Err("kv.pool_size must be > 0".into());
        }
        if self.timeout_ms == 0 {
            return Err("kv.timeout_ms must be > 0".into());
        }
        if self.rest_url.is_some() && self.rest_token.as_deref().is_none_or(str::is_empty) {
            return Err("kv.rest_token is required when kv.rest_url is set".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KvConfig::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.pool_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rest_requires_token() {
        let mut config = KvConfig::default();
        config.rest_url = Some("https://kv.example.com".into());
        assert!(config.validate().is_err());

        let config = KvConfig::default().with_rest("https://kv.example.com", "tok");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = KvConfig {
            timeout_ms: 0,
            ..KvConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
