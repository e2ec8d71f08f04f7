//! Probe error types.
//!
//! [`ProbeError`] is the central error type for both probes. The variants
//! exist so log lines carry a useful category; neither binary changes its
//! exit behaviour based on them.

/// Errors raised by the subscriber probe and the database smoke test.
///
/// # Categories
///
/// | Variant           | Raised by            | Meaning                                  |
/// |-------------------|----------------------|------------------------------------------|
/// | `InvalidEndpoint` | subscriber wiring    | `SOCKET_URL` is not a usable server URL  |
/// | `Transport`       | subscriber           | Socket.IO client failed to connect/emit  |
/// | `Config`          | pool construction    | Unusable database URL                    |
/// | `Acquire`         | smoke test           | No connection could be acquired          |
/// | `Query`           | customer repository  | Statement failed or a column undecodable |
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The realtime server URL is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Socket.IO client failure.
    #[error("transport error: {0}")]
    Transport(#[from] rust_socketio::Error),

    /// Configuration could not be turned into a working client.
    #[error("configuration error: {0}")]
    Config(String),

    /// Acquiring a pooled database connection failed.
    #[error("could not acquire database connection: {0}")]
    Acquire(sqlx::Error),

    /// Executing the customer query failed.
    #[error("query failed: {0}")]
    Query(sqlx::Error),
}

impl ProbeError {
    /// Returns a short, stable category label for structured log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint(_) => "invalid_endpoint",
            Self::Transport(_) => "transport",
            Self::Config(_) => "config",
            Self::Acquire(_) => "acquire",
            Self::Query(_) => "query",
        }
    }
}
