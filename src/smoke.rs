//! Database smoke test.
//!
//! Linear state machine with no back-edges:
//!
//! ```text
//! start → acquire → query → (ok: render | err: keep error) → release → done
//! ```
//!
//! The pooled connection is released on both paths before [`run`] returns.
//! Exiting the process is left to the binary.

use std::io::{self, Write};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::ProbeConfig;
use crate::customers::{self, Customer};
use crate::error::ProbeError;

/// Fixed prefix of the line reported when the smoke test fails.
pub const FAILURE_PREFIX: &str = "database smoke test failed";

/// Result of one smoke test run.
#[derive(Debug)]
pub enum SmokeOutcome {
    /// The query succeeded.
    Printed {
        /// Rows in query order.
        customers: Vec<Customer>,
        /// Rendered table.
        table: String,
    },
    /// Acquisition or the query failed.
    Failed(ProbeError),
}

impl SmokeOutcome {
    /// Returns the text to show the user: the table, or the failure line.
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            Self::Printed { table, .. } => table.clone(),
            Self::Failed(e) => format!("{FAILURE_PREFIX}: {e}"),
        }
    }

    /// Writes the report: the table to `out`, or the failure line to `err`.
    ///
    /// The failure line goes to `err` regardless of the log filter.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writers.
    pub fn write_report<O, E>(&self, out: &mut O, err: &mut E) -> io::Result<()>
    where
        O: Write,
        E: Write,
    {
        match self {
            Self::Printed { .. } => writeln!(out, "{}", self.report()),
            Self::Failed(_) => writeln!(err, "{}", self.report()),
        }
    }

    /// Returns `true` if the query succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Printed { .. })
    }
}

/// Builds the connection pool without connecting.
///
/// Connections are opened on first acquisition, so an unreachable server
/// surfaces from [`run`] rather than here.
///
/// # Errors
///
/// Returns [`ProbeError::Config`] if `DATABASE_URL` cannot be parsed.
pub fn connect_pool(config: &ProbeConfig) -> Result<PgPool, ProbeError> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections.max(1))
        .acquire_timeout(config.database_connect_timeout())
        .connect_lazy(&config.database_url)
        .map_err(|e| ProbeError::Config(e.to_string()))
}

/// Acquires one connection, runs the recent-customers query, and releases
/// the connection.
pub async fn run(pool: &PgPool) -> SmokeOutcome {
    let mut conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => return SmokeOutcome::Failed(ProbeError::Acquire(e)),
    };
    tracing::debug!("connection acquired");

    let result = customers::fetch_recent(&mut conn).await;

    drop(conn);
    tracing::debug!("connection released");

    match result {
        Ok(rows) => {
            let table = customers::render(&rows);
            SmokeOutcome::Printed {
                customers: rows,
                table,
            }
        }
        Err(e) => SmokeOutcome::Failed(e),
    }
}
