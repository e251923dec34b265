use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware,
    routing::get,
};
use catalogo_auth::{AuthService, AuthState, JwtError, JwtService};
use catalogo_db_kv::KvStorage;
use catalogo_db_postgres::{PostgresStorage, mask_password};
use catalogo_kv::{DynKvStore, create_kv_store};
use catalogo_storage::{DynUserStorage, DynVehicleStorage};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    cache::CacheBackend,
    config::AppConfig,
    handlers,
    middleware::{self as app_middleware, RequestId},
    routes,
    service::VehicleService,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub vehicles: VehicleService,
    pub auth: AuthService,
    pub auth_state: AuthState,
}

impl FromRef<AppState> for VehicleService {
    fn from_ref(state: &AppState) -> Self {
        state.vehicles.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth_state.clone()
    }
}

/// Record stores selected by configuration.
#[derive(Clone)]
pub struct Backends {
    pub vehicles: DynVehicleStorage,
    pub users: DynUserStorage,
    pub kv: DynKvStore,
}

impl Backends {
    /// Connects the key-value store and the record store.
    ///
    /// The key-value store always backs the cache. Records go to PostgreSQL
    /// when `storage.postgres` is configured and to the key-value store
    /// otherwise. A configured key-value backend that cannot be reached
    /// fails startup instead of being replaced by process memory.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let kv = create_kv_store(&cfg.kv)
            .await
            .context("key-value backend unavailable")?;

        if let Some(pg) = &cfg.storage.postgres {
            tracing::info!(url = %mask_password(&pg.url), "Using PostgreSQL document store");
            let storage = Arc::new(PostgresStorage::new(pg.clone()).await?);
            return Ok(Self {
                vehicles: storage.clone(),
                users: storage,
                kv,
            });
        }

        if kv.backend_name() == "memory" {
            tracing::warn!(
                "Records are kept in process memory and are lost on restart; configure storage.postgres or kv.redis_url"
            );
        }
        tracing::info!(backend = kv.backend_name(), "Using key-value record store");
        let storage = Arc::new(KvStorage::new(kv.clone()));
        Ok(Self {
            vehicles: storage.clone(),
            users: storage,
            kv,
        })
    }

    /// Key-value record store and cache over one shared store.
    pub fn key_value(kv: DynKvStore) -> Self {
        let storage = Arc::new(KvStorage::new(kv.clone()));
        Self {
            vehicles: storage.clone(),
            users: storage,
            kv,
        }
    }
}

impl AppState {
    /// Wires services over already-connected backends.
    ///
    /// # Errors
    ///
    /// Fails if the JWT secret is unusable.
    pub fn new(cfg: AppConfig, backends: Backends) -> Result<Self, JwtError> {
        let jwt = Arc::new(JwtService::new(&cfg.auth.jwt_secret, cfg.token_ttl())?);
        let cache = CacheBackend::new(backends.kv, cfg.cache.op_timeout());
        let vehicles = VehicleService::new(backends.vehicles, cache, cfg.cache.listing_ttl());
        let auth = AuthService::new(backends.users.clone(), jwt.clone());
        let auth_state = AuthState::new(jwt, backends.users);

        Ok(Self {
            config: Arc::new(cfg),
            vehicles,
            auth,
            auth_state,
        })
    }
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let request_timeout = state.config.request_timeout();

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/auth", routes::auth::router())
        .nest("/api/veiculos", routes::vehicles::router())
        .fallback(handlers::not_found)
        .with_state(state)
        // Middleware stack (outermost last: request id -> cors -> trace -> timeout -> body limit)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.0.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct CatalogoServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Connects backends and assembles the router.
    pub async fn build(self) -> anyhow::Result<CatalogoServer> {
        let backends = Backends::from_config(&self.config).await?;
        let state = AppState::new(self.config, backends)?;

        Ok(CatalogoServer {
            addr: self.addr,
            app: build_app(state),
        })
    }
}

impl CatalogoServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
