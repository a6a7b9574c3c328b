//! Startup wiring: configuration, credentials and transport in, watchdog out.

use std::sync::Arc;
use tracing::info;

use crate::adapters::{HttpTransport, PowerController};
use crate::config::AppConfig;
use crate::credentials::CredentialProvider;
use crate::error::{Result, WatchdogError};
use crate::supervisor::{RecoverySequencer, Watchdog, WatchdogConfig};

/// Load and validate configuration from `config_dir`
pub fn load_config(config_dir: &str) -> Result<AppConfig> {
    let config = AppConfig::load_from(config_dir)?;
    config.validate().map_err(WatchdogError::InvalidConfig)?;
    Ok(config)
}

pub fn build_sequencer(config: &AppConfig, transport: Arc<dyn HttpTransport>) -> RecoverySequencer {
    RecoverySequencer::new(PowerController::new(transport), &config.kvm)
}

/// Acquire credentials, then assemble the watchdog.
///
/// Nothing touches the network before the credentials are in hand, and a
/// credential failure returns before the watchdog exists.
pub fn build_watchdog(
    config: &AppConfig,
    provider: &dyn CredentialProvider,
    transport: Arc<dyn HttpTransport>,
) -> Result<Watchdog> {
    let credentials = provider.acquire()?;

    info!(
        "Watching {} (power off: {}, power on: {})",
        config.monitor.server_addr, config.kvm.power_off_url, config.kvm.power_on_url
    );

    let sequencer = build_sequencer(config, transport.clone());
    Watchdog::new(
        WatchdogConfig::from(&config.monitor),
        transport,
        sequencer,
        credentials,
    )
}
