pub mod adapters;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod supervisor;

pub use adapters::{HttpTransport, PowerAction, PowerController, ReqwestTransport};
pub use config::AppConfig;
pub use credentials::{CredentialProvider, Credentials, EnvCredentials, TerminalPrompt};
pub use error::{PowerError, RecoveryError, RecoveryStage, Result, TransportError, WatchdogError};
pub use supervisor::{
    HealthCheckResult, RecoveryOutcome, RecoverySequencer, TickReport, Watchdog, WatchdogConfig,
};
