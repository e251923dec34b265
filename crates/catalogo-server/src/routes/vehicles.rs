//! Vehicle endpoints. Reads are public; writes require an admin token.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
};
use catalogo_auth::AdminAuth;
use catalogo_core::{Vehicle, VehicleFilter, VehiclePatch};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::server::AppState;
use crate::service::{ListQuery, ListingPage, VehicleService};

pub const CACHE_STATUS_HEADER: &str = "x-cache";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(read).put(update).delete(remove))
}

/// Raw listing query string. Values arrive as text so that a bad `page`
/// or `limit` falls back to the default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub year: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TryFrom<ListParams> for ListQuery {
    type Error = ApiError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let year = match params.year.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| ApiError::bad_request("year must be an integer"))?,
            ),
        };
        Ok(ListQuery {
            filter: VehicleFilter {
                brand: params.brand,
                vehicle_type: params.vehicle_type,
                year,
            },
            page: lenient_count(params.page.as_deref()),
            limit: lenient_count(params.limit.as_deref()),
        })
    }
}

/// Parses a count; unparsable input is treated as absent and negative
/// input as zero (the service clamps both).
fn lenient_count(raw: Option<&str>) -> Option<u64> {
    let value: i64 = raw?.trim().parse().ok()?;
    Some(u64::try_from(value).unwrap_or(0))
}

/// `GET /api/veiculos` → `{data, total, page, limit}` with `X-Cache`.
pub async fn list(
    State(vehicles): State<VehicleService>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = vehicles.find_all(ListQuery::try_from(params)?).await?;
    let cache_status = if listing.from_cache { "HIT" } else { "MISS" };
    Ok((
        [(
            HeaderName::from_static(CACHE_STATUS_HEADER),
            HeaderValue::from_static(cache_status),
        )],
        Json::<ListingPage>(listing.page),
    ))
}

/// `GET /api/veiculos/{id}`.
pub async fn read(
    State(vehicles): State<VehicleService>,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, ApiError> {
    vehicles
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::vehicle_not_found)
}

/// `POST /api/veiculos` (admin) → 201.
pub async fn create(
    AdminAuth(admin): AdminAuth,
    State(vehicles): State<VehicleService>,
    ApiJson(payload): ApiJson<VehiclePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = vehicles.create(payload).await?;
    tracing::debug!(admin = %admin.id, id = %vehicle.id, "create handled");
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// `PUT /api/veiculos/{id}` (admin); partial update.
pub async fn update(
    AdminAuth(_admin): AdminAuth,
    State(vehicles): State<VehicleService>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<VehiclePatch>,
) -> Result<Json<Vehicle>, ApiError> {
    vehicles
        .update(&id, payload)
        .await?
        .map(Json)
        .ok_or_else(ApiError::vehicle_not_found)
}

/// `DELETE /api/veiculos/{id}` (admin) → `{message}`.
pub async fn remove(
    AdminAuth(_admin): AdminAuth,
    State(vehicles): State<VehicleService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match vehicles.delete(&id).await? {
        Some(_) => Ok(Json(json!({ "message": "Veículo excluído com sucesso" }))),
        None => Err(ApiError::vehicle_not_found()),
    }
}
