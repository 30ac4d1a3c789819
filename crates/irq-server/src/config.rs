//! Server configuration

use anyhow::Result;
use irq_lib::{collector::DEFAULT_INTERRUPTS_FILE, BalanceStrategy, PinMode};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host name used to tag structured events
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Interrupt statistics table read for every details request
    #[serde(default = "default_interrupts_file")]
    pub interrupts_file: PathBuf,

    /// Root of the proc filesystem consulted by pin requests
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    /// Strategy used when a details request does not name one
    #[serde(default)]
    pub default_strategy: BalanceStrategy,

    /// Whether pin requests write to procfs or only log
    #[serde(default)]
    pub pin_mode: PinMode,
}

fn default_host_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_interrupts_file() -> PathBuf {
    PathBuf::from(DEFAULT_INTERRUPTS_FILE)
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host_name: default_host_name(),
            api_port: default_api_port(),
            interrupts_file: default_interrupts_file(),
            proc_root: default_proc_root(),
            default_strategy: BalanceStrategy::default(),
            pin_mode: PinMode::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `irq-server` file and `IRQ_*`
    /// environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("irq-server").required(false))
            .add_source(config::Environment::with_prefix("IRQ").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
