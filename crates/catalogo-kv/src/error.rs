use thiserror::Error;

/// Errors raised by key-value backends.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("REST key-value API returned {status}: {message}")]
    Rest { status: u16, message: String },

    #[error("Unexpected response for {command}: {message}")]
    UnexpectedResponse { command: String, message: String },

    #[error("Operation against a key holding the wrong kind of value: {key}")]
    WrongType { key: String },

    #[error("Value at {key} is not an integer")]
    NotAnInteger { key: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    pub fn unexpected(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn wrong_type(key: impl Into<String>) -> Self {
        Self::WrongType { key: key.into() }
    }

    /// Returns `true` if the backend could not be reached.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Redis(e) => e.is_connection_refusal() || e.is_io_error() || e.is_timeout(),
            Self::Pool(_) => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

impl From<deadpool_redis::PoolError> for KvError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<deadpool_redis::CreatePoolError> for KvError {
    fn from(err: deadpool_redis::CreatePoolError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type KvResult<T> = std::result::Result<T, KvError>;
