//! IRQ balancer CLI
//!
//! A command-line tool for inspecting interrupt distribution, comparing
//! balancing strategies and pinning IRQs through the irq-server API.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{local, remote};
use irq_lib::BalanceStrategy;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// IRQ Balancer CLI
#[derive(Parser)]
#[command(name = "irqctl")]
#[command(author, version, about = "CLI for the IRQ Balancer", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via IRQCTL_API_URL env var)
    #[arg(long, env = "IRQCTL_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch interrupt details from the service
    Details {
        /// Window start, %Y-%m-%dT%H:%M:%S (defaults to one hour ago)
        #[arg(long)]
        begin_time: Option<String>,

        /// Window end, %Y-%m-%dT%H:%M:%S (defaults to now)
        #[arg(long)]
        end_time: Option<String>,

        /// Balance strategy, or "current" for the unbalanced distribution
        #[arg(long, short)]
        strategy: Option<String>,
    },

    /// Pin an IRQ to a CPU through the service
    Pin {
        /// IRQ number
        #[arg(allow_negative_numbers = true)]
        irq_num: i64,

        /// Target CPU index
        #[arg(allow_negative_numbers = true)]
        cpu: i64,
    },

    /// Analyze a local interrupt table
    Analyze {
        /// Interrupt statistics table
        #[arg(long, env = "IRQCTL_INTERRUPTS_FILE", default_value = "/proc/interrupts")]
        file: PathBuf,

        /// Balance strategy to simulate (shows the current state if omitted)
        #[arg(long, short)]
        strategy: Option<BalanceStrategy>,
    },

    /// Compare every balance strategy on a local interrupt table
    Compare {
        /// Interrupt statistics table
        #[arg(long, env = "IRQCTL_INTERRUPTS_FILE", default_value = "/proc/interrupts")]
        file: PathBuf,
    },

    /// Compute a plan from a local table and send each instruction to the service
    Apply {
        /// Interrupt statistics table
        #[arg(long, env = "IRQCTL_INTERRUPTS_FILE", default_value = "/proc/interrupts")]
        file: PathBuf,

        /// Balance strategy
        #[arg(long, short, default_value = "reverse-sorted-least-used")]
        strategy: BalanceStrategy,

        /// Print the plan without sending pin requests
        #[arg(long)]
        dry_run: bool,
    },
}

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new("debug"))
            .init();
    }

    match cli.command {
        Commands::Details {
            begin_time,
            end_time,
            strategy,
        } => {
            let now = chrono::Local::now().naive_local();
            let begin_time = begin_time
                .unwrap_or_else(|| (now - chrono::Duration::hours(1)).format(TIME_FORMAT).to_string());
            let end_time = end_time.unwrap_or_else(|| now.format(TIME_FORMAT).to_string());

            let client = client::ApiClient::new(&cli.api_url)?;
            remote::show_details(&client, &begin_time, &end_time, strategy.as_deref(), cli.format)
                .await?;
        }
        Commands::Pin { irq_num, cpu } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            remote::pin_irq(&client, irq_num, cpu, cli.format).await?;
        }
        Commands::Analyze { file, strategy } => {
            local::analyze(&file, strategy, cli.format).await?;
        }
        Commands::Compare { file } => {
            local::compare(&file, cli.format).await?;
        }
        Commands::Apply {
            file,
            strategy,
            dry_run,
        } => {
            let client = if dry_run {
                None
            } else {
                Some(client::ApiClient::new(&cli.api_url)?)
            };
            local::apply(client.as_ref(), &file, strategy, cli.format).await?;
        }
    }

    Ok(())
}
