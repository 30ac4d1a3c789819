//! IRQ balancer server
//!
//! Serves interrupt distribution reports computed from a
//! `/proc/interrupts`-style table and accepts single-IRQ pin requests.

use anyhow::Result;
use irq_lib::{EventLogger, IrqMetrics};
use irq_server::{api, config};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting irq-server");

    let config = config::ServerConfig::load()?;
    info!(
        interrupts_file = %config.interrupts_file.display(),
        proc_root = %config.proc_root.display(),
        "Server configured"
    );

    let metrics = IrqMetrics::new();
    let logger = EventLogger::new(&config.host_name);
    logger.log_startup(
        SERVER_VERSION,
        config.default_strategy.name(),
        config.pin_mode.name(),
    );

    let port = config.api_port;
    let app_state = Arc::new(api::AppState::new(config, metrics, logger.clone()));
    let mut api_handle = tokio::spawn(api::serve(port, app_state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = &mut api_handle => {
            if let Ok(Err(e)) = &result {
                error!(error = %e, "API server stopped");
            }
            logger.log_shutdown("API server exited");
            result??;
        }
    }

    info!("Shutting down");
    Ok(())
}
