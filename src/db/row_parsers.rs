use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;

fn parse_datetime_str(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 (e.g. 2025-11-19T12:34:56Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // sqlx's own encoding: "YYYY-MM-DD HH:MM:SS.fff+00:00"
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite default timestamp format
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::internal("invalid datetime: date out of range"))?;
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn column<'r>(row: &'r SqliteRow, col: &str) -> Result<Option<&'r str>, AppError> {
    row.try_get::<Option<&str>, _>(col)
        .map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

pub fn uuid(row: &SqliteRow, col: &str) -> Result<Uuid, AppError> {
    opt_uuid(row, col)?.ok_or_else(|| AppError::internal(format!("null {}", col)))
}

pub fn opt_uuid(row: &SqliteRow, col: &str) -> Result<Option<Uuid>, AppError> {
    column(row, col)?
        .map(|s| Uuid::parse_str(s).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", col, e))))
        .transpose()
}

pub fn datetime(row: &SqliteRow, col: &str) -> Result<DateTime<Utc>, AppError> {
    opt_datetime(row, col)?.ok_or_else(|| AppError::internal(format!("null {}", col)))
}

pub fn opt_datetime(row: &SqliteRow, col: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    match column(row, col)?.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime_str(s)?)),
        _ => Ok(None),
    }
}

/// Parses a closed-set string column (statuses, roles, user types).
pub fn parsed<T>(row: &SqliteRow, col: &str) -> Result<T, AppError>
where
    T: FromStr<Err = AppError>,
{
    let raw = column(row, col)?.ok_or_else(|| AppError::internal(format!("null {}", col)))?;
    raw.parse::<T>()
        .map_err(|e| AppError::internal(format!("unexpected value in {}: {}", col, e)))
}
