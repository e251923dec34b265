//! Vehicle queries.

use catalogo_core::{Vehicle, VehicleFilter, VehiclePatch, now_utc};
use catalogo_storage::StorageError;
use serde_json::Value;
use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::PgPool;

use super::time_to_chrono;
use crate::error::query_error;

/// Filter predicate shared by listing and counting. Parameters `$1..$3`
/// are brand (lower-cased), type and year; NULL disables a condition.
const FILTER: &str = r#"($1::text IS NULL OR lower(resource->>'brand') = $1)
  AND ($2::text IS NULL OR resource->>'type' = $2)
  AND ($3::int IS NULL OR (resource->>'year')::int = $3)"#;

const ORDER: &str = r#"ORDER BY created_at DESC, id COLLATE "C" DESC"#;

struct FilterParams {
    brand: Option<String>,
    vehicle_type: Option<String>,
    year: Option<i32>,
}

impl From<&VehicleFilter> for FilterParams {
    fn from(filter: &VehicleFilter) -> Self {
        Self {
            brand: filter.brand.as_ref().map(|b| b.to_lowercase()),
            vehicle_type: filter.vehicle_type.clone(),
            year: filter.year,
        }
    }
}

fn decode(value: Value) -> Result<Vehicle, StorageError> {
    Ok(serde_json::from_value(value)?)
}

pub async fn insert(pool: &PgPool, vehicle: &Vehicle) -> Result<(), StorageError> {
    let resource = serde_json::to_value(vehicle)?;
    query(
        "INSERT INTO vehicles (id, created_at, updated_at, resource) VALUES ($1, $2, $3, $4)",
    )
    .bind(&vehicle.id)
    .bind(time_to_chrono(vehicle.created_at))
    .bind(time_to_chrono(vehicle.updated_at))
    .bind(&resource)
    .execute(pool)
    .await
    .map_err(|e| query_error("insert vehicle", e))?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Vehicle>, StorageError> {
    let row: Option<Value> = query_scalar("SELECT resource FROM vehicles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("find vehicle", e))?;
    row.map(decode).transpose()
}

/// Matching vehicles in listing order. `window` is `(offset, limit)`.
pub async fn find(
    pool: &PgPool,
    filter: &VehicleFilter,
    window: Option<(i64, i64)>,
) -> Result<Vec<Vehicle>, StorageError> {
    let params = FilterParams::from(filter);
    let rows: Vec<Value> = match window {
        Some((offset, limit)) => {
            let sql = format!(
                "SELECT resource FROM vehicles WHERE {FILTER} {ORDER} LIMIT $4 OFFSET $5"
            );
            query_scalar(&sql)
                .bind(params.brand)
                .bind(params.vehicle_type)
                .bind(params.year)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
        }
        None => {
            let sql = format!("SELECT resource FROM vehicles WHERE {FILTER} {ORDER}");
            query_scalar(&sql)
                .bind(params.brand)
                .bind(params.vehicle_type)
                .bind(params.year)
                .fetch_all(pool)
                .await
        }
    }
    .map_err(|e| query_error("list vehicles", e))?;

    rows.into_iter().map(decode).collect()
}

pub async fn count(pool: &PgPool, filter: &VehicleFilter) -> Result<u64, StorageError> {
    let params = FilterParams::from(filter);
    let sql = format!("SELECT COUNT(*) FROM vehicles WHERE {FILTER}");
    let total: i64 = query_scalar(&sql)
        .bind(params.brand)
        .bind(params.vehicle_type)
        .bind(params.year)
        .fetch_one(pool)
        .await
        .map_err(|e| query_error("count vehicles", e))?;
    Ok(u64::try_from(total).unwrap_or_default())
}

/// Read-merge-write under a row lock.
pub async fn update(
    pool: &PgPool,
    id: &str,
    patch: VehiclePatch,
) -> Result<Option<Vehicle>, StorageError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| query_error("begin update", e))?;

    let row: Option<Value> =
        query_scalar("SELECT resource FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| query_error("lock vehicle", e))?;

    let Some(row) = row else {
        tx.rollback()
            .await
            .map_err(|e| query_error("rollback update", e))?;
        return Ok(None);
    };

    let mut vehicle = decode(row)?;
    vehicle.apply(patch, now_utc());
    let resource = serde_json::to_value(&vehicle)?;

    query("UPDATE vehicles SET updated_at = $2, resource = $3 WHERE id = $1")
        .bind(id)
        .bind(time_to_chrono(vehicle.updated_at))
        .bind(&resource)
        .execute(&mut *tx)
        .await
        .map_err(|e| query_error("update vehicle", e))?;

    tx.commit()
        .await
        .map_err(|e| query_error("commit update", e))?;
    Ok(Some(vehicle))
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<Option<Vehicle>, StorageError> {
    let row: Option<Value> = query_scalar("DELETE FROM vehicles WHERE id = $1 RETURNING resource")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("delete vehicle", e))?;
    row.map(decode).transpose()
}
