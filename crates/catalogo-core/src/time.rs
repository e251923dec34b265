use time::OffsetDateTime;

/// Current UTC time truncated to microseconds.
///
/// Every backend stores timestamps at microsecond precision (PostgreSQL
/// `timestamptz`, sorted-set scores in the key-value store), so values are
/// truncated once here and compare equal after a storage round trip.
pub fn now_utc() -> OffsetDateTime {
    truncate_to_micros(OffsetDateTime::now_utc())
}

pub fn truncate_to_micros(dt: OffsetDateTime) -> OffsetDateTime {
    let micros = dt.nanosecond() / 1_000;
    dt.replace_nanosecond(micros * 1_000).unwrap_or(dt)
}

/// Microseconds since the Unix epoch.
pub fn unix_micros(dt: OffsetDateTime) -> i64 {
    (dt.unix_timestamp_nanos() / 1_000) as i64
}

pub fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}
