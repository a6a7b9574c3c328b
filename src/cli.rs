use clap::{Parser, Subcommand, ValueEnum};

use crate::credentials::{CredentialProvider, EnvCredentials, TerminalPrompt};

#[derive(Parser)]
#[command(name = "kvm-watchdog")]
#[command(author = "kvm-watchdog developers")]
#[command(version)]
#[command(about = "Power-cycles an unresponsive server through its KVM", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and per-environment overrides
    #[arg(short, long, default_value = "config", env = "KVMWD_CONFIG_DIR")]
    pub config_dir: String,

    /// Where the KVM username and password come from
    #[arg(long, value_enum, default_value_t = CredentialSource::Prompt)]
    pub credentials: CredentialSource,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Monitor the server and power-cycle it when it stops answering (default)
    Run,
    /// Ping the server once and print the result, never resets
    Check,
    /// Power-cycle the server once right now
    Reset,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Ask on the terminal, password is not echoed
    Prompt,
    /// Read KVMWD_KVM_USERNAME and KVMWD_KVM_PASSWORD
    Env,
}

impl CredentialSource {
    pub fn provider(&self) -> Box<dyn CredentialProvider> {
        match self {
            Self::Prompt => Box::new(TerminalPrompt),
            Self::Env => Box::new(EnvCredentials),
        }
    }
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
