//! Key-value store clients for the Catalogo server.
//!
//! [`KvStore`] abstracts the shared store that holds listing cache entries,
//! the cache version counter and, for the key-value record backend, the
//! records and their indexes. Implementations:
//!
//! - [`RedisKv`]: Redis through a `deadpool-redis` pool
//! - [`RestKv`]: Upstash / Vercel KV compatible REST API
//! - [`MemoryKv`]: in-process `DashMap`, development only
//!
//! Use [`create_kv_store`] to pick one from configuration.

pub mod config;
pub mod error;
pub mod factory;
pub mod memory;
pub mod redis_kv;
pub mod rest_kv;
mod traits;

pub use config::KvConfig;
pub use error::{KvError, KvResult};
pub use factory::{create_kv_store, mask_credentials};
pub use memory::MemoryKv;
pub use redis_kv::RedisKv;
pub use rest_kv::RestKv;
pub use traits::{DynKvStore, KvStore};
