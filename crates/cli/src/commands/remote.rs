//! Commands that talk to a running irq-server

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{print_details, print_json, print_success, OutputFormat};

/// Show the service's interrupt details for a time window
pub async fn show_details(
    client: &ApiClient,
    begin_time: &str,
    end_time: &str,
    strategy: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let details = client
        .interrupt_details(begin_time, end_time, strategy)
        .await?;

    print_details(&details, format)
}

/// Pin one IRQ to one CPU through the service
pub async fn pin_irq(client: &ApiClient, irq_num: i64, cpu: i64, format: OutputFormat) -> Result<()> {
    let result = client.pin_irq(irq_num, cpu).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!("IRQ {} pinned to CPU{}", result.irq_num, result.cpu));
        }
    }

    Ok(())
}
