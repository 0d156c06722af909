//! todokv HTTP server.

use anyhow::Context as _;
use todokv_server::{Config, serve, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("invalid configuration")?;
    telemetry::init_tracing(&config.log).context("failed to initialize tracing")?;
    telemetry::report_config(&config.log);

    let metrics = todokv_runtime::metrics::install_recorder()
        .context("failed to install metrics recorder")?;

    tracing::info!(
        address = %config.server.address(),
        db_path = %config.storage.path.display(),
        "Starting todokv"
    );

    serve(config, Some(metrics)).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
