//! Repository layer: owner-scoped database operations.

mod report;
mod user;

pub use report::*;
pub use user::*;

/// Timestamp format for `created_at` columns (fixed width, sorts lexically).
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub(crate) fn parse_timestamp(raw: &str) -> Result<chrono::NaiveDateTime, super::DatabaseError> {
    chrono::NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| super::DatabaseError::ConstraintViolation(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<uuid::Uuid, super::DatabaseError> {
    uuid::Uuid::parse_str(raw).map_err(|e| super::DatabaseError::ConstraintViolation(e.to_string()))
}

/// Current UTC time at the precision stored in the database.
pub(crate) fn now_timestamp() -> chrono::NaiveDateTime {
    use chrono::SubsecRound;
    chrono::Utc::now().naive_utc().trunc_subsecs(6)
}
