//! Recovery Playbook
//!
//! The one remediation this watchdog knows: hold the power button until the
//! host is off, give the hardware time to settle, then press it again.

use std::time::Duration;
use tracing::info;

use crate::adapters::{PowerAction, PowerController};
use crate::config::KvmConfig;
use crate::credentials::Credentials;
use crate::error::{PowerError, RecoveryError, RecoveryStage};

/// Result of one power-cycle attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Succeeded,
    FailedAt {
        stage: RecoveryStage,
        cause: PowerError,
    },
}

impl RecoveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RecoveryOutcome::Succeeded)
    }
}

impl From<Result<(), RecoveryError>> for RecoveryOutcome {
    fn from(result: Result<(), RecoveryError>) -> Self {
        match result {
            Ok(()) => RecoveryOutcome::Succeeded,
            Err(RecoveryError { stage, cause }) => RecoveryOutcome::FailedAt { stage, cause },
        }
    }
}

/// Power-off, settle, power-on. No rollback: if the power-on press fails the
/// host is left off.
#[derive(Clone)]
pub struct RecoverySequencer {
    controller: PowerController,
    power_off_url: String,
    power_on_url: String,
    settle_delay: Duration,
}

impl RecoverySequencer {
    pub fn new(controller: PowerController, config: &KvmConfig) -> Self {
        Self {
            controller,
            power_off_url: config.power_off_url.clone(),
            power_on_url: config.power_on_url.clone(),
            settle_delay: config.settle_delay(),
        }
    }

    fn endpoint(&self, action: PowerAction) -> &str {
        match action {
            PowerAction::PowerOff => &self.power_off_url,
            PowerAction::PowerOn => &self.power_on_url,
        }
    }

    async fn press(
        &self,
        stage: RecoveryStage,
        credentials: &Credentials,
    ) -> Result<(), RecoveryError> {
        self.controller
            .send_power_action(self.endpoint(stage.action()), credentials)
            .await
            .map_err(|cause| RecoveryError::new(stage, cause))
    }

    /// Power-cycle the host. Power-on is only attempted after power-off succeeded.
    pub async fn reset(&self, credentials: &Credentials) -> Result<(), RecoveryError> {
        info!("Resetting server");

        self.press(RecoveryStage::PowerOff, credentials).await?;

        info!(
            "Power off accepted, waiting {:?} before power on",
            self.settle_delay
        );
        tokio::time::sleep(self.settle_delay).await;

        self.press(RecoveryStage::PowerOn, credentials).await?;

        info!("Server reset successfully");
        Ok(())
    }
}
