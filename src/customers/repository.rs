//! PostgreSQL access for customer rows.
//!
//! Column types are not fixed: each column is decoded by trying the Rust
//! types its SQL type may map to, in order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use super::models::Customer;
use crate::error::ProbeError;

/// Maximum number of rows the smoke test reads.
pub const RECENT_CUSTOMERS_LIMIT: usize = 10;

/// The one statement the smoke test issues.
pub const RECENT_CUSTOMERS_SQL: &str =
    "SELECT Codigo, Nombre, FechaAlta FROM clientes ORDER BY FechaAlta DESC LIMIT 10";

/// Fetches the most recently created customers on a borrowed connection.
///
/// # Errors
///
/// Returns a [`ProbeError::Query`] if the statement fails or a column has a
/// type none of the candidates decode.
pub async fn fetch_recent(conn: &mut PgConnection) -> Result<Vec<Customer>, ProbeError> {
    let rows = sqlx::query(RECENT_CUSTOMERS_SQL)
        .fetch_all(&mut *conn)
        .await
        .map_err(ProbeError::Query)?;

    rows.iter()
        .map(|row| decode_customer(row).map_err(ProbeError::Query))
        .collect()
}

fn decode_customer(row: &PgRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        code: decode_code(row)?,
        name: row.try_get::<Option<String>, _>(1)?,
        created_at: decode_created_at(row)?,
    })
}

/// `Codigo`: any integer width or a character type.
fn decode_code(row: &PgRow) -> Result<String, sqlx::Error> {
    if let Ok(v) = row.try_get::<Option<i32>, _>(0) {
        return Ok(v.map(|v| v.to_string()).unwrap_or_default());
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
        return Ok(v.map(|v| v.to_string()).unwrap_or_default());
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(0) {
        return Ok(v.map(|v| v.to_string()).unwrap_or_default());
    }
    row.try_get::<Option<String>, _>(0)
        .map(Option::unwrap_or_default)
}

/// `FechaAlta`: `TIMESTAMP`, `TIMESTAMPTZ` or `DATE`.
fn decode_created_at(row: &PgRow) -> Result<Option<NaiveDateTime>, sqlx::Error> {
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(2) {
        return Ok(v);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(2) {
        return Ok(v.map(|ts| ts.naive_utc()));
    }
    row.try_get::<Option<NaiveDate>, _>(2)
        .map(|v| v.and_then(|d| d.and_hms_opt(0, 0, 0)))
}
