pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod server;
pub mod service;

pub use cache::CacheBackend;
pub use config::{AppConfig, AuthSettings, CacheConfig, LoggingConfig, ServerConfig, StorageConfig};
pub use error::ApiError;
pub use observability::{init_tracing, shutdown_tracing};
pub use server::{AppState, Backends, CatalogoServer, ServerBuilder, build_app};
pub use service::{ListQuery, Listing, ListingPage, ServiceError, VehicleService};
