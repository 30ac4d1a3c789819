//! Commands that read an interrupt table directly, without the service

use anyhow::{Context, Result};
use colored::Colorize;
use irq_lib::{BalanceReport, BalanceStrategy, StatCollection};
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, IrqDetails};
use crate::output::{
    format_dispersion, format_percent, print_details, print_error, print_info, print_json,
    print_rows, print_success, print_warning, OutputFormat,
};

/// Row for the strategy comparison table
#[derive(Tabled)]
struct StrategyRow {
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Dispersion")]
    dispersion: String,
    #[tabled(rename = "Busiest CPU")]
    busiest_cpu: String,
    #[tabled(skip)]
    raw_dispersion: Option<f64>,
}

async fn load(file: &Path) -> Result<StatCollection> {
    let collection = StatCollection::load(file)
        .await
        .with_context(|| format!("Failed to load {}", file.display()))?;

    tracing::debug!(
        records = collection.records().len(),
        cpu_count = collection.cpu_count(),
        skipped_lines = collection.skipped_lines(),
        "Loaded interrupt table"
    );
    Ok(collection)
}

fn busiest_share(report: &BalanceReport) -> String {
    report
        .per_cpu_percent
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(cpu, &percent)| format!("CPU{} ({})", cpu, format_percent(percent)))
        .unwrap_or_else(|| "-".to_string())
}

/// Show the current distribution, or the one a strategy would produce
pub async fn analyze(
    file: &Path,
    strategy: Option<BalanceStrategy>,
    format: OutputFormat,
) -> Result<()> {
    let collection = load(file).await?;

    let report = match strategy {
        Some(strategy) => strategy.compute_balance(&collection)?,
        None => collection.current_report(),
    };

    print_details(&IrqDetails::from_report(&report), format)
}

/// Compare the current distribution with every strategy
pub async fn compare(file: &Path, format: OutputFormat) -> Result<()> {
    let collection = load(file).await?;

    let mut reports = vec![("current".to_string(), collection.current_report())];
    for strategy in BalanceStrategy::ALL {
        reports.push((strategy.name().to_string(), strategy.compute_balance(&collection)?));
    }

    let best = reports
        .iter()
        .filter_map(|(_, r)| r.dispersion)
        .min_by(|a, b| a.total_cmp(b));

    let rows: Vec<StrategyRow> = reports
        .iter()
        .map(|(name, report)| {
            let dispersion = format_dispersion(report.dispersion_or_sentinel());
            let is_best = best.is_some() && report.dispersion == best;
            StrategyRow {
                strategy: name.clone(),
                dispersion: if is_best {
                    dispersion.green().bold().to_string()
                } else {
                    dispersion
                },
                busiest_cpu: busiest_share(report),
                raw_dispersion: report.dispersion,
            }
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let json: Vec<_> = rows
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "strategy": r.strategy,
                        "dispersion": r.raw_dispersion,
                    })
                })
                .collect();
            print_json(&json)?;
        }
        OutputFormat::Table => {
            if collection.is_empty() {
                print_warning("No interrupt sources found");
                return Ok(());
            }
            print_rows(rows);
            println!(
                "\n{} sources across {} CPUs",
                collection.records().len(),
                collection.cpu_count()
            );
        }
    }

    Ok(())
}

/// Compute a plan locally and send each instruction as a pin request
pub async fn apply(
    client: Option<&ApiClient>,
    file: &Path,
    strategy: BalanceStrategy,
    format: OutputFormat,
) -> Result<()> {
    let collection = load(file).await?;
    let report = strategy.compute_balance(&collection)?;

    let Some(client) = client else {
        match format {
            OutputFormat::Json => print_json(&report.instructions)?,
            OutputFormat::Table => {
                print_warning("Dry-run mode - no pin requests sent");
                print_info(&format!(
                    "{} would produce dispersion {}",
                    strategy,
                    format_dispersion(report.dispersion_or_sentinel())
                ));
                for instruction in &report.instructions {
                    println!("  {}", instruction);
                }
            }
        }
        return Ok(());
    };

    let mut failures = 0usize;
    for instruction in &report.instructions {
        match client
            .pin_irq(i64::from(instruction.irq), instruction.cpu as i64)
            .await
        {
            Ok(_) => {
                if matches!(format, OutputFormat::Table) {
                    print_success(&instruction.to_string());
                }
            }
            Err(e) => {
                failures += 1;
                print_error(&format!("{}: {:#}", instruction, e));
            }
        }
    }

    if failures > 0 {
        anyhow::bail!(
            "{} of {} pin requests failed",
            failures,
            report.instructions.len()
        );
    }

    match format {
        OutputFormat::Json => print_json(&report.instructions)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Applied {} pin instructions using {}",
                report.instructions.len(),
                strategy
            ));
        }
    }

    Ok(())
}
