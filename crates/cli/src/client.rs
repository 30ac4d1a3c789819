//! API client for communicating with the IRQ balancer service

use anyhow::{Context, Result};
use irq_lib::BalanceReport;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the IRQ balancer service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request with query parameters
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request with a form-encoded body
    pub async fn post_form<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .form(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Fetch the interrupt details report
    pub async fn interrupt_details(
        &self,
        begin_time: &str,
        end_time: &str,
        strategy: Option<&str>,
    ) -> Result<IrqDetails> {
        let mut query = vec![("begin_time", begin_time), ("end_time", end_time)];
        if let Some(strategy) = strategy {
            query.push(("strategy", strategy));
        }

        let envelope: DetailsEnvelope = self.get("irq/v1/interrupt_details", &query).await?;
        Ok(envelope.irq_details)
    }

    /// Ask the service to pin one IRQ
    pub async fn pin_irq(&self, irq_num: i64, cpu: i64) -> Result<PinResult> {
        let response: PinResponse = self
            .post_form("irq/v1/pin_irq", &PinRequest { irq_num, cpu })
            .await?;
        Ok(response.ok)
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailsEnvelope {
    pub irq_details: IrqDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrqDetails {
    #[serde(default)]
    pub strategy: String,
    pub cpus: Vec<CpuEntry>,
    pub irq_cpu_percent_distribution: Vec<f64>,
    pub irq_cpu_count_distribution: Vec<u64>,
    pub irq_distribution_metric: f64,
    pub irq_stats: Vec<IrqStat>,
    #[serde(default)]
    pub irq_balance_instructions: Vec<String>,
}

impl IrqDetails {
    /// Same shape as the service response, built from a local report
    pub fn from_report(report: &BalanceReport) -> Self {
        Self {
            strategy: report
                .strategy
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| "current".to_string()),
            cpus: report
                .cpus()
                .into_iter()
                .map(|c| CpuEntry {
                    cpu: c.cpu,
                    interrupts: c.interrupts,
                    percent: c.percent,
                })
                .collect(),
            irq_cpu_percent_distribution: report.per_cpu_percent.clone(),
            irq_cpu_count_distribution: report.per_cpu_counts.clone(),
            irq_distribution_metric: report.dispersion_or_sentinel(),
            irq_stats: report
                .balanced_stats
                .iter()
                .map(|r| IrqStat {
                    irq_num: r.irq(),
                    irq_device: r.device().to_string(),
                    irq_type: r.irq_type().to_string(),
                    cpu_interrupts: r.per_cpu_counts().to_vec(),
                    cpu_interrupt_total: r.total(),
                })
                .collect(),
            irq_balance_instructions: report.instructions.iter().map(|i| i.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuEntry {
    pub cpu: String,
    pub interrupts: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrqStat {
    pub irq_num: u32,
    pub irq_device: String,
    pub irq_type: String,
    pub cpu_interrupts: Vec<u64>,
    pub cpu_interrupt_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRequest {
    pub irq_num: i64,
    pub cpu: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "OK")]
    pub ok: PinResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResult {
    pub irq_num: u32,
    pub cpu: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
