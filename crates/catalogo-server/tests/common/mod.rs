#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use catalogo_kv::{DynKvStore, MemoryKv};
use catalogo_server::{AppConfig, AppState, Backends, build_app};
use serde_json::{Value, json};
use tower::ServiceExt;

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "integration-secret".into();
    cfg
}

/// App over one in-process key-value store.
pub fn memory_app() -> Router {
    app_with(Backends::key_value(Arc::new(MemoryKv::new())))
}

pub fn app_with(backends: Backends) -> Router {
    app_with_config(test_config(), backends)
}

pub fn app_with_config(cfg: AppConfig, backends: Backends) -> Router {
    build_app(AppState::new(cfg, backends).expect("state"))
}

pub fn split_backends(records: DynKvStore, cache: DynKvStore) -> Backends {
    let records = Backends::key_value(records);
    Backends {
        kv: cache,
        ..records
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn cache_status(&self) -> &str {
        self.headers
            .get("x-cache")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Reply {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, path: &str) -> Reply {
    send(app, Method::GET, path, None, None).await
}

/// Registers an account with `role` and returns a token for it.
pub async fn token_for(app: &Router, email: &str, role: &str) -> String {
    let reply = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Tester",
            "email": email,
            "password": "secret123",
            "role": role,
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);

    let reply = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
    reply.body["token"].as_str().unwrap().to_string()
}

pub async fn create_vehicle(app: &Router, token: &str, body: Value) -> Value {
    let reply = send(app, Method::POST, "/api/veiculos", Some(token), Some(body)).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
    reply.body
}

pub fn vehicle(brand: &str, vehicle_type: &str, year: i32) -> Value {
    json!({ "brand": brand, "type": vehicle_type, "year": year })
}
