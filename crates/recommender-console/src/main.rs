use std::sync::Arc;

use recommender_common::client::BackendClient;
use tokio::task::LocalSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recommender_console::app::{spawn_stdin_reader, App};
use recommender_console::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the rendered pages.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting recommender console");

    let config = Config::from_env()?;
    info!(
        base_url = %config.backend.base_url,
        timeout_secs = config.backend.timeout.map(|t| t.as_secs()),
        top_k = config.top_k,
        "configuration loaded"
    );

    let client = BackendClient::new(config.backend.clone())?;

    // The console stays usable without the probe; every action reports its own failure.
    match client.health().await {
        Ok(health) => info!(status = %health.status, "backend reachable"),
        Err(e) => warn!(error = %e, "backend unreachable, continuing"),
    }

    let app = App::new(Arc::new(client), config.top_k);
    let input = spawn_stdin_reader()?;
    let mut stdout = std::io::stdout();
    LocalSet::new()
        .run_until(app.run(input, &mut stdout))
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "console error");
        })?;

    info!("console shut down");
    Ok(())
}
