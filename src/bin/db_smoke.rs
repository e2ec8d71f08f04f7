//! Database smoke test entry point.
//!
//! Always exits with status 0 once the connection has been released.

use pedidos_probes::config::ProbeConfig;
use pedidos_probes::smoke::{self, SmokeOutcome};
use pedidos_probes::telemetry;

#[tokio::main]
async fn main() {
    let config = ProbeConfig::from_env();
    telemetry::init(config.log_format);

    let outcome = match smoke::connect_pool(&config) {
        Ok(pool) => {
            let outcome = smoke::run(&pool).await;
            pool.close().await;
            outcome
        }
        Err(e) => SmokeOutcome::Failed(e),
    };

    match &outcome {
        SmokeOutcome::Printed { customers, .. } => {
            tracing::info!(rows = customers.len(), "customers fetched");
        }
        SmokeOutcome::Failed(e) => {
            tracing::debug!(kind = e.kind(), "smoke test failed");
        }
    }

    if let Err(e) = outcome.write_report(&mut std::io::stdout(), &mut std::io::stderr()) {
        tracing::warn!(error = %e, "could not write report");
    }

    std::process::exit(0);
}
