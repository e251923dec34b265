//! User queries. `email` carries a unique index, so duplicate registration
//! is rejected atomically by the database.

use catalogo_core::User;
use catalogo_storage::StorageError;
use serde_json::Value;
use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::PgPool;

use super::time_to_chrono;
use crate::error::{is_unique_violation, query_error};

fn decode(value: Value) -> Result<User, StorageError> {
    Ok(serde_json::from_value(value)?)
}

pub async fn insert(pool: &PgPool, user: &User) -> Result<(), StorageError> {
    let resource = serde_json::to_value(user)?;
    query(
        "INSERT INTO users (id, email, created_at, updated_at, resource) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(time_to_chrono(user.created_at))
    .bind(time_to_chrono(user.updated_at))
    .bind(&resource)
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StorageError::already_exists("user", &user.email)
        } else {
            query_error("insert user", e)
        }
    })?;
    Ok(())
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, StorageError> {
    let row: Option<Value> = query_scalar("SELECT resource FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("find user", e))?;
    row.map(decode).transpose()
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, StorageError> {
    let row: Option<Value> = query_scalar("SELECT resource FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("find user", e))?;
    row.map(decode).transpose()
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<Option<User>, StorageError> {
    let row: Option<Value> = query_scalar("DELETE FROM users WHERE id = $1 RETURNING resource")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("delete user", e))?;
    row.map(decode).transpose()
}
