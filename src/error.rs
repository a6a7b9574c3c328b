use reqwest::StatusCode;
use thiserror::Error;

use crate::adapters::PowerAction;

/// Main error type for the watchdog
#[derive(Error, Debug)]
pub enum WatchdogError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    // Startup errors
    #[error("Credential acquisition failed: {0}")]
    CredentialAcquisition(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Remediation errors
    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for WatchdogError
pub type Result<T> = std::result::Result<T, WatchdogError>;

/// Failure to get any response at all out of a remote endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// A single KVM button press that did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PowerError {
    #[error("unexpected status code: {}", .0.as_u16())]
    UnexpectedStatus(StatusCode),

    #[error("couldn't send KVM request: {0}")]
    Transport(#[from] TransportError),
}

/// Step of the power-cycle sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    PowerOff,
    PowerOn,
}

impl RecoveryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PowerOff => "power off",
            Self::PowerOn => "power on",
        }
    }

    /// The button press performed at this stage
    pub fn action(&self) -> PowerAction {
        match self {
            Self::PowerOff => PowerAction::PowerOff,
            Self::PowerOn => PowerAction::PowerOn,
        }
    }
}

impl std::fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to {stage} machine: {cause}")]
pub struct RecoveryError {
    pub stage: RecoveryStage,
    #[source]
    pub cause: PowerError,
}

impl RecoveryError {
    pub fn new(stage: RecoveryStage, cause: PowerError) -> Self {
        Self { stage, cause }
    }
}
