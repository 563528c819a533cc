//! trunk-service
//!
//! ```text
//!   load config ──▶ init logging ──▶ bind ──▶ routes ──▶ run_async
//!                                                          │
//!        exit ◀── cleanup: server.shutdown(ctx) ◀── SIGINT/SIGTERM
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use trunk_service::config::load_config_for_env;
use trunk_service::http::{handlers, HttpServer};
use trunk_service::lifecycle::{wait_for_shutdown_with, ManagedService, OsSignals};
use trunk_service::observability::init_logging;

#[derive(Parser)]
#[command(name = "trunk-service")]
#[command(about = "HTTP service with bounded graceful shutdown", long_about = None)]
struct Cli {
    /// Directory holding application.toml and application-{env}.toml.
    #[arg(long, env = "APP_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Deployment environment selecting the overlay file.
    #[arg(long, env = "APP_ENV", default_value = "local")]
    env: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config_for_env(&cli.config_dir, &cli.env)?;
    init_logging(&config.logging)?;

    tracing::info!(
        service = %config.service.name,
        env = %cli.env,
        bind_address = %config.server.bind_address,
        shutdown_timeout_ms = config.shutdown.timeout_ms,
        "Configuration loaded"
    );

    let root = CancellationToken::new();
    // Install handlers before serving so an early SIGTERM is not fatal.
    let signals = OsSignals::new();

    let mut server = HttpServer::bind(&config.server).await?;
    server.setup(handlers::routes);
    server.run_async();

    let grace = Duration::from_millis(config.shutdown.timeout_ms);
    let report = wait_for_shutdown_with(&root, grace, signals, |ctx| async move {
        if let Err(e) = server.shutdown(&ctx).await {
            tracing::error!(service = server.name(), error = %e, "Shutdown incomplete");
        }
    })
    .await;

    tracing::info!(
        trigger = %report.trigger,
        outcome = ?report.outcome,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Shutdown complete"
    );
    Ok(())
}
