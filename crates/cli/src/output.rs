//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::IrqDetails;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the per-CPU table
#[derive(Tabled)]
struct CpuRow {
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Interrupts")]
    interrupts: String,
    #[tabled(rename = "Share")]
    share: String,
}

/// Row for the per-IRQ table
#[derive(Tabled)]
struct IrqRow {
    #[tabled(rename = "IRQ")]
    irq: u32,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Type")]
    irq_type: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Per CPU")]
    per_cpu: String,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table from a list of rows
pub fn print_rows<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print an interrupt details report, either from the service or local
pub fn print_details(details: &IrqDetails, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(details)?,
        OutputFormat::Table => {
            println!("{}", "Interrupt Distribution".bold());
            println!("{}", "=".repeat(60));
            println!("Strategy:   {}", details.strategy.cyan());
            println!(
                "Dispersion: {}",
                format_dispersion(details.irq_distribution_metric)
            );
            println!();

            if details.cpus.is_empty() {
                print_warning("No CPU columns found");
            } else {
                print_rows(
                    details
                        .cpus
                        .iter()
                        .map(|c| CpuRow {
                            cpu: c.cpu.clone(),
                            interrupts: format_count(c.interrupts),
                            share: format_percent(c.percent),
                        })
                        .collect(),
                );
            }

            if details.irq_stats.is_empty() {
                print_warning("No interrupt sources found");
                return Ok(());
            }

            println!();
            print_rows(
                details
                    .irq_stats
                    .iter()
                    .map(|s| IrqRow {
                        irq: s.irq_num,
                        device: s.irq_device.clone(),
                        irq_type: s.irq_type.clone(),
                        total: format_count(s.cpu_interrupt_total),
                        per_cpu: s
                            .cpu_interrupts
                            .iter()
                            .map(|c| c.to_string())
                            .collect::<Vec<_>>()
                            .join(" "),
                    })
                    .collect(),
            );

            if !details.irq_balance_instructions.is_empty() {
                println!("\n{}", "Instructions".bold());
                for instruction in &details.irq_balance_instructions {
                    println!("  {}", instruction);
                }
            }
        }
    }

    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a counter with thousands separators
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Format dispersion, `n/a` for the undefined sentinel
pub fn format_dispersion(dispersion: f64) -> String {
    if dispersion < 0.0 {
        "n/a".dimmed().to_string()
    } else {
        format!("{:.2}", dispersion)
    }
}
