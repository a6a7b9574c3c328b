mod main_runtime;

use anyhow::Context;
use clap::Parser;
use kvm_watchdog::adapters::{HttpTransport, ReqwestTransport};
use kvm_watchdog::bootstrap;
use kvm_watchdog::cli::{Cli, Commands};
use kvm_watchdog::supervisor;
use std::sync::Arc;
use tracing::{error, info};

use main_runtime::{init_logging, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(&cli.config_dir)
        .with_context(|| format!("failed to load configuration from {}", cli.config_dir))?;
    let _log_guard = init_logging(&config.logging);

    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestTransport::new(config.monitor.request_timeout())?);

    match cli.command() {
        Commands::Check => {
            let health = supervisor::ping(transport.as_ref(), &config.monitor.server_addr).await;
            if !health.is_healthy() {
                anyhow::bail!("{} is {}", config.monitor.server_addr, health);
            }
            println!("{}: {}", config.monitor.server_addr, health);
        }
        Commands::Reset => {
            let credentials = cli.credentials.provider().acquire().map_err(|e| {
                error!("Error getting credentials: {}", e);
                e
            })?;
            bootstrap::build_sequencer(&config, transport)
                .reset(&credentials)
                .await?;
        }
        Commands::Run => {
            let provider = cli.credentials.provider();
            let watchdog = bootstrap::build_watchdog(&config, provider.as_ref(), transport)
                .map_err(|e| {
                    error!("Error getting credentials: {}", e);
                    e
                })?;

            tokio::select! {
                _ = watchdog.run() => {},
                _ = shutdown_signal() => info!("Shutdown signal received, stopping watchdog"),
            }
        }
    }

    Ok(())
}
