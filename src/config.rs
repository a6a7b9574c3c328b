use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub kvm: KvmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Address that is pinged for errors
    pub server_addr: String,
    /// Seconds between the start of consecutive health checks
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Timeout applied to every HTTP request, pings and button presses alike
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Power-cycle when the ping gets no response at all, not only on a bad status
    #[serde(default = "default_recover_on_unreachable")]
    pub recover_on_unreachable: bool,
}

fn default_check_interval() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    10
}

fn default_recover_on_unreachable() -> bool {
    true
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KvmConfig {
    /// ATX long press endpoint (forces power off)
    pub power_off_url: String,
    /// ATX short press endpoint (powers on)
    pub power_on_url: String,
    /// Seconds to wait between power off and power on
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
}

fn default_settle_delay() -> u64 {
    5
}

impl KvmConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rotated log files
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig {
                server_addr: "https://example.com".to_string(),
                check_interval_secs: default_check_interval(),
                request_timeout_secs: default_request_timeout(),
                recover_on_unreachable: default_recover_on_unreachable(),
            },
            kvm: KvmConfig {
                power_off_url: "https://pikvm.example.com/api/atx/click?button=power_long"
                    .to_string(),
                power_on_url: "https://pikvm.example.com/api/atx/click?button=power".to_string(),
                settle_delay_secs: default_settle_delay(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir, None)
    }

    /// Like `load_from`, but reads `KVMWD_*` variables from `env` instead of
    /// the process environment when it is `Some`.
    pub fn load_with_env<P: AsRef<Path>>(
        config_dir: P,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Self::default();
        let env_name = match &env {
            Some(vars) => vars.get("KVMWD_ENV").cloned(),
            None => std::env::var("KVMWD_ENV").ok(),
        }
        .unwrap_or_else(|| "development".to_string());

        let builder = Config::builder()
            // Start with default values
            .set_default("monitor.server_addr", defaults.monitor.server_addr)?
            .set_default("monitor.check_interval_secs", default_check_interval())?
            .set_default("monitor.request_timeout_secs", default_request_timeout())?
            .set_default(
                "monitor.recover_on_unreachable",
                default_recover_on_unreachable(),
            )?
            .set_default("kvm.power_off_url", defaults.kvm.power_off_url)?
            .set_default("kvm.power_on_url", defaults.kvm.power_on_url)?
            .set_default("kvm.settle_delay_secs", default_settle_delay())?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(File::from(config_dir.join(env_name)).required(false))
            // Override with environment variables (KVMWD_MONITOR__SERVER_ADDR, etc.)
            .add_source(
                Environment::with_prefix("KVMWD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("monitor.server_addr", &self.monitor.server_addr),
            ("kvm.power_off_url", &self.kvm.power_off_url),
            ("kvm.power_on_url", &self.kvm.power_on_url),
        ] {
            if let Err(e) = check_http_url(value) {
                errors.push(format!("{name} {e}"));
            }
        }

        if self.kvm.power_off_url == self.kvm.power_on_url {
            errors.push("kvm.power_off_url and kvm.power_on_url must differ".to_string());
        }

        if self.monitor.check_interval_secs == 0 {
            errors.push("monitor.check_interval_secs must be positive".to_string());
        }

        if self.monitor.request_timeout_secs == 0 {
            errors.push("monitor.request_timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("is not a valid URL ({raw}): {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("must use http or https, got {other}")),
    }
}
