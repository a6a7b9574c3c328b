//! Watchdog Loop for Server Health Monitoring
//!
//! Pings the monitored server on a fixed interval and power-cycles it through
//! the KVM when the ping fails. Ticks run strictly one after another: a
//! recovery in progress delays the next check instead of overlapping it.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::playbook::{RecoveryOutcome, RecoverySequencer};
use crate::adapters::HttpTransport;
use crate::config::MonitorConfig;
use crate::credentials::Credentials;
use crate::error::{Result as WatchdogResult, TransportError, WatchdogError};

/// Classification of a single ping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckResult {
    /// Server answered `200 OK`
    Healthy,
    /// No response at all (connect error, timeout, DNS)
    Unreachable(TransportError),
    /// Server answered with anything other than `200 OK`
    UnexpectedStatus(StatusCode),
}

impl HealthCheckResult {
    pub fn classify(response: Result<StatusCode, TransportError>) -> Self {
        match response {
            Ok(StatusCode::OK) => HealthCheckResult::Healthy,
            Ok(status) => HealthCheckResult::UnexpectedStatus(status),
            Err(e) => HealthCheckResult::Unreachable(e),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthCheckResult::Healthy)
    }
}

impl std::fmt::Display for HealthCheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthCheckResult::Healthy => write!(f, "healthy"),
            HealthCheckResult::Unreachable(e) => write!(f, "unreachable ({})", e),
            HealthCheckResult::UnexpectedStatus(s) => write!(f, "unexpected status {}", s.as_u16()),
        }
    }
}

/// Ping `server_addr` once and classify the answer
pub async fn ping(transport: &dyn HttpTransport, server_addr: &str) -> HealthCheckResult {
    HealthCheckResult::classify(transport.get(server_addr).await)
}

/// What happened during one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub checked_at: DateTime<Utc>,
    pub health: HealthCheckResult,
    /// `None` when no recovery was attempted
    pub recovery: Option<RecoveryOutcome>,
}

/// Configuration for the watchdog loop
#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// Address that is pinged
    pub server_addr: String,
    /// Minimum time between the start of two consecutive checks (default: 5 min)
    pub check_interval: Duration,
    /// Also power-cycle when the ping gets no response (default: true)
    pub recover_on_unreachable: bool,
}

impl From<&MonitorConfig> for WatchdogConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            server_addr: config.server_addr.clone(),
            check_interval: config.check_interval(),
            recover_on_unreachable: config.recover_on_unreachable,
        }
    }
}

/// Health monitor. Owns the credentials for its whole lifetime and lends
/// them to every recovery attempt.
pub struct Watchdog {
    config: WatchdogConfig,
    transport: Arc<dyn HttpTransport>,
    sequencer: RecoverySequencer,
    credentials: Credentials,
}

impl Watchdog {
    /// Fails if `config.check_interval` is zero.
    pub fn new(
        config: WatchdogConfig,
        transport: Arc<dyn HttpTransport>,
        sequencer: RecoverySequencer,
        credentials: Credentials,
    ) -> WatchdogResult<Self> {
        if config.check_interval.is_zero() {
            return Err(WatchdogError::InvalidConfig(vec![
                "check interval must be positive".to_string(),
            ]));
        }

        Ok(Self {
            config,
            transport,
            sequencer,
            credentials,
        })
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Ping the monitored server once
    pub async fn check_health(&self) -> HealthCheckResult {
        let result = ping(self.transport.as_ref(), &self.config.server_addr).await;

        match &result {
            HealthCheckResult::Healthy => debug!("Ping {} ok", self.config.server_addr),
            HealthCheckResult::Unreachable(e) => error!("Ping request failed: {}", e),
            HealthCheckResult::UnexpectedStatus(s) => {
                error!("Server returns error: {}", s.as_u16())
            }
        }

        result
    }

    fn needs_recovery(&self, health: &HealthCheckResult) -> bool {
        match health {
            HealthCheckResult::Healthy => false,
            HealthCheckResult::UnexpectedStatus(_) => true,
            HealthCheckResult::Unreachable(_) => self.config.recover_on_unreachable,
        }
    }

    /// Power-cycle the host once. The outcome is logged and returned, never propagated.
    pub async fn recover(&self) -> RecoveryOutcome {
        let outcome = RecoveryOutcome::from(self.sequencer.reset(&self.credentials).await);

        if let RecoveryOutcome::FailedAt { stage, cause } = &outcome {
            error!("Server reset error at {}: {}", stage, cause);
        }

        outcome
    }

    /// One check, followed by a full recovery if the check failed
    pub async fn tick(&self) -> TickReport {
        let checked_at = Utc::now();
        let health = self.check_health().await;

        let recovery = if self.needs_recovery(&health) {
            Some(self.recover().await)
        } else {
            if !health.is_healthy() {
                warn!("Server unreachable, power cycle on unreachable is disabled");
            }
            None
        };

        TickReport {
            checked_at,
            health,
            recovery,
        }
    }

    /// Run forever. The first check happens one interval after start.
    pub async fn run(&self) {
        let period = self.config.check_interval;
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Starting status ping of {} every {:?}",
            self.config.server_addr, period
        );

        loop {
            interval.tick().await;
            let report = self.tick().await;

            if let Some(outcome) = &report.recovery {
                debug!(
                    "Tick at {} finished: {}, recovery succeeded: {}",
                    report.checked_at,
                    report.health,
                    outcome.is_success()
                );
            }
        }
    }
}
