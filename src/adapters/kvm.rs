//! KVM ATX power button adapter.
//!
//! A PiKVM exposes the host's power button as `POST /api/atx/click?button=...`.
//! A long press forces the host off, a short press turns it back on.

use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{debug, warn};

use super::http::HttpTransport;
use crate::credentials::Credentials;
use crate::error::PowerError;

/// Which ATX button press to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    /// Long press, forces power off
    PowerOff,
    /// Short press, powers on
    PowerOn,
}

impl PowerAction {
    /// Value of the `button` query parameter PiKVM expects for this press
    pub fn button(&self) -> &'static str {
        match self {
            Self::PowerOff => "power_long",
            Self::PowerOn => "power",
        }
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.button())
    }
}

/// Sends authenticated button presses to the KVM. Stateless and never retries.
#[derive(Clone)]
pub struct PowerController {
    transport: Arc<dyn HttpTransport>,
}

impl PowerController {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Press a button by posting to `endpoint`. Only `200 OK` counts as done.
    pub async fn send_power_action(
        &self,
        endpoint: &str,
        credentials: &Credentials,
    ) -> Result<(), PowerError> {
        let status = self.transport.post(endpoint, credentials).await?;

        if status != StatusCode::OK {
            warn!("KVM endpoint {} answered {}", endpoint, status);
            return Err(PowerError::UnexpectedStatus(status));
        }

        debug!("KVM accepted button press at {}", endpoint);
        Ok(())
    }
}
