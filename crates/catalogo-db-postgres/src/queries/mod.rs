//! SQL query modules for the PostgreSQL document store.
//!
//! Each table stores the full record as JSONB in `resource`; the row's
//! columns mirror the key and timestamps for indexing and ordering.

pub mod users;
pub mod vehicles;

use chrono::{DateTime, Utc};
use time::OffsetDateTime;

/// Converts time OffsetDateTime to chrono DateTime for binding.
pub(crate) fn time_to_chrono(dt: OffsetDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond()).unwrap_or_default()
}
