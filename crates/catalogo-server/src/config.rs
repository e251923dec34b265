use catalogo_db_postgres::PostgresConfig;
use catalogo_kv::KvConfig;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Shared key-value store: cache, version counter and, without
    /// `storage.postgres`, the records themselves.
    #[serde(default)]
    pub kv: KvConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout_ms == 0 {
            return Err("server.request_timeout_ms must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Cache validations
        if self.cache.listing_ttl_secs == 0 {
            return Err("cache.listing_ttl_secs must be > 0".into());
        }
        if self.cache.op_timeout_ms == 0 {
            return Err("cache.op_timeout_ms must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Auth validation
        if self.auth.jwt_secret.trim().is_empty() {
            return Err("auth.jwt_secret must be set".into());
        }
        if self.auth.token_ttl_secs == 0 {
            return Err("auth.token_ttl_secs must be > 0".into());
        }
        // Backends
        self.kv.validate()?;
        if let Some(ref pg) = self.storage.postgres {
            pg.validate()?;
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn token_ttl(&self) -> time::Duration {
        time::Duration::seconds(i64::try_from(self.auth.token_ttl_secs).unwrap_or(i64::MAX))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout_ms() -> u64 {
    15_000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Record store selection: the PostgreSQL document store when `postgres`
/// is present, the key-value store otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL of a cached listing page.
    #[serde(default = "default_listing_ttl_secs")]
    pub listing_ttl_secs: u64,
    /// Upper bound for a single cache operation; slower calls count as misses.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

fn default_listing_ttl_secs() -> u64 {
    300
}
fn default_op_timeout_ms() -> u64 {
    250
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            listing_ttl_secs: default_listing_ttl_secs(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

impl CacheConfig {
    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HMAC secret for access tokens. Required.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl_secs() -> u64 {
    catalogo_auth::DEFAULT_TOKEN_TTL_SECS
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Conventional deployment variables and the settings they fill in when
    /// the matching `CATALOGO__` variable is not set.
    const ENV_ALIASES: &[(&str, &str, &str)] = &[
        ("PORT", "CATALOGO__SERVER__PORT", "server.port"),
        ("JWT_SECRET", "CATALOGO__AUTH__JWT_SECRET", "auth.jwt_secret"),
        ("DATABASE_URL", "CATALOGO__STORAGE__POSTGRES__URL", "storage.postgres.url"),
        ("REDIS_URL", "CATALOGO__KV__REDIS_URL", "kv.redis_url"),
        ("KV_REST_API_URL", "CATALOGO__KV__REST_URL", "kv.rest_url"),
        ("KV_REST_API_TOKEN", "CATALOGO__KV__REST_TOKEN", "kv.rest_token"),
    ];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("catalogo.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., CATALOGO__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("CATALOGO")
                .try_parsing(true)
                .separator("__"),
        );
        for (alias, canonical, key) in ENV_ALIASES {
            if std::env::var_os(canonical).is_some() {
                continue;
            }
            if let Ok(value) = std::env::var(alias)
                && !value.is_empty()
            {
                builder = builder
                    .set_override(*key, value)
                    .map_err(|e| format!("config override error for {alias}: {e}"))?;
            }
        }
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "secret".into();
        cfg
    }

    #[test]
    fn test_defaults() {
        let cfg = valid();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cache.listing_ttl_secs, 300);
        assert_eq!(cfg.cache.op_timeout_ms, 250);
        assert_eq!(cfg.auth.token_ttl_secs, 604_800);
        assert!(cfg.storage.postgres.is_none());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.contains("jwt_secret"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut cfg = valid();
        cfg.server.port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.server.request_timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.cache.op_timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.kv.rest_url = Some("https://kv.example.com".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let cfg = valid();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("<redacted>"));
    }
}
