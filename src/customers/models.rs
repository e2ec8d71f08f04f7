//! Database model for the `clientes` table.

use chrono::NaiveDateTime;

/// One row of the recent-customers query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Customer identifier (`Codigo`), as text whatever its column type.
    pub code: String,
    /// Display name (`Nombre`).
    pub name: Option<String>,
    /// Registration timestamp (`FechaAlta`); zoned values are kept in UTC.
    pub created_at: Option<NaiveDateTime>,
}
