//! Supervisor Layer for Server Monitoring and Recovery
//!
//! - Watchdog loop pinging the monitored server
//! - Playbook power-cycling it through the KVM when a ping fails

pub mod playbook;
pub mod watchdog;

pub use playbook::{RecoveryOutcome, RecoverySequencer};
pub use watchdog::{ping, HealthCheckResult, TickReport, Watchdog, WatchdogConfig};
