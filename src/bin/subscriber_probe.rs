//! Realtime subscriber probe entry point.
//!
//! Runs until Ctrl-C or until the server closes the connection.

use pedidos_probes::config::ProbeConfig;
use pedidos_probes::{subscriber, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ProbeConfig::from_env();
    telemetry::init(config.log_format);

    let probe = subscriber::connect(&config).await?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let reason = probe.run_until(shutdown).await?;
    tracing::info!(?reason, "subscriber probe stopped");

    Ok(())
}
