//! HTTP API for interrupt details, IRQ pinning, health and Prometheus metrics

use crate::config::ServerConfig;
use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::NaiveDateTime;
use irq_lib::{
    AffinityPinner, BalanceReport, BalanceStrategy, CpuShare, EventLogger, InterruptRecord,
    IrqError, IrqMetrics, PinInstruction, StatCollection,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Format accepted for `begin_time` and `end_time`
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub pinner: AffinityPinner,
    pub metrics: IrqMetrics,
    pub logger: EventLogger,
}

impl AppState {
    pub fn new(config: ServerConfig, metrics: IrqMetrics, logger: EventLogger) -> Self {
        let writer = config.pin_mode.writer(&config.proc_root);
        let pinner = AffinityPinner::with_proc_path(&config.proc_root, writer);

        Self {
            config,
            pinner,
            metrics,
            logger,
        }
    }
}

/// Errors surfaced to API callers as `{"message": ...}`
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request arguments
    BadRequest(String),
    Irq(IrqError),
}

impl From<IrqError> for ApiError {
    fn from(error: IrqError) -> Self {
        ApiError::Irq(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Irq(error) => {
                let status = match &error {
                    e if e.is_precondition() => StatusCode::BAD_REQUEST,
                    IrqError::UnknownStrategy(_) | IrqError::InvalidInstruction(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, error.to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Which distribution a details request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    /// As parsed, no balancing
    Current,
    Balanced(BalanceStrategy),
}

impl FromStr for ReportView {
    type Err = IrqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("current") {
            Ok(ReportView::Current)
        } else {
            s.parse().map(ReportView::Balanced)
        }
    }
}

impl ReportView {
    pub fn build(&self, collection: &StatCollection) -> Result<BalanceReport, IrqError> {
        match self {
            ReportView::Current => Ok(collection.current_report()),
            ReportView::Balanced(strategy) => strategy.compute_balance(collection),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailsParams {
    begin_time: Option<String>,
    end_time: Option<String>,
    strategy: Option<String>,
}

/// Body of the details response, wrapped in an `irq_details` envelope
#[derive(Debug, Serialize)]
pub struct IrqDetails {
    pub strategy: String,
    pub cpus: Vec<CpuShare>,
    pub irq_cpu_percent_distribution: Vec<f64>,
    pub irq_cpu_count_distribution: Vec<u64>,
    pub irq_distribution_metric: f64,
    pub irq_stats: Vec<InterruptRecord>,
    pub irq_balance_instructions: Vec<PinInstruction>,
}

impl From<BalanceReport> for IrqDetails {
    fn from(report: BalanceReport) -> Self {
        Self {
            strategy: report
                .strategy
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| "current".to_string()),
            cpus: report.cpus(),
            irq_distribution_metric: report.dispersion_or_sentinel(),
            irq_cpu_percent_distribution: report.per_cpu_percent,
            irq_cpu_count_distribution: report.per_cpu_counts,
            irq_stats: report.balanced_stats,
            irq_balance_instructions: report.instructions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailsResponse {
    pub irq_details: IrqDetails,
}

fn parse_time(name: &str, value: Option<&str>) -> Result<NaiveDateTime, String> {
    value
        .and_then(|v| NaiveDateTime::parse_from_str(v, TIME_FORMAT).ok())
        .ok_or_else(|| format!("bad {}, use {}", name, TIME_FORMAT))
}

/// `GET /irq/v1/interrupt_details`
///
/// The time window is validated but does not select data: the statistics
/// source holds cumulative counters only.
///
/// `irq_num` in `irq_stats` is a JSON number (`16`, not `"16"`), as is
/// `irq_num` in the pin response.
async fn interrupt_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetailsParams>,
) -> Result<Json<DetailsResponse>, ApiError> {
    let begin = parse_time("begin_time", params.begin_time.as_deref());
    let end = parse_time("end_time", params.end_time.as_deref());
    let (begin, end) = match (begin, end) {
        (Ok(begin), Ok(end)) => (begin, end),
        (begin, end) => {
            let errors: Vec<String> = [begin.err(), end.err()].into_iter().flatten().collect();
            return Err(ApiError::BadRequest(errors.join("; ")));
        }
    };

    let view = match params.strategy.as_deref() {
        Some(name) => name.parse::<ReportView>()?,
        None => ReportView::Balanced(state.config.default_strategy),
    };
    debug!(%begin, %end, ?view, "Interrupt details requested");

    let source = state.config.interrupts_file.display().to_string();
    let started = Instant::now();

    let report = match build_report(&state, view).await {
        Ok(report) => report,
        Err(error) => {
            state.metrics.inc_report_errors();
            state.logger.log_report_failure(&source, &error);
            return Err(error.into());
        }
    };

    state
        .metrics
        .observe_report_latency(started.elapsed().as_secs_f64());
    state.metrics.set_dispersion(report.dispersion_or_sentinel());
    state.logger.log_report(&source, &report);

    Ok(Json(DetailsResponse {
        irq_details: report.into(),
    }))
}

async fn build_report(state: &AppState, view: ReportView) -> Result<BalanceReport, IrqError> {
    let collection = StatCollection::load(&state.config.interrupts_file).await?;
    state
        .metrics
        .record_load(collection.records().len(), collection.skipped_lines());
    view.build(&collection)
}

#[derive(Debug, Deserialize)]
pub struct PinParams {
    irq_num: Option<String>,
    cpu: Option<String>,
}

fn parse_int(value: Option<&str>, help: &str) -> Result<i64, String> {
    value
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| help.to_string())
}

/// `POST /irq/v1/pin_irq` with form fields `irq_num` and `cpu`
async fn pin_irq(
    State(state): State<Arc<AppState>>,
    form: Result<Form<PinParams>, FormRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Form(params) = form.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let irq_num = parse_int(params.irq_num.as_deref(), "irq_num must be an integer");
    let cpu = parse_int(params.cpu.as_deref(), "cpu must be an integer");
    let (irq_num, cpu) = match (irq_num, cpu) {
        (Ok(irq_num), Ok(cpu)) => (irq_num, cpu),
        (irq_num, cpu) => {
            let errors: Vec<String> = [irq_num.err(), cpu.err()].into_iter().flatten().collect();
            return Err(ApiError::BadRequest(errors.join("; ")));
        }
    };

    let result = state.pinner.pin(irq_num, cpu).await;
    state.metrics.record_pin(&result);
    state.logger.log_pin(irq_num, cpu, &result);

    let request = result?;
    Ok(Json(json!({
        "OK": { "irq_num": request.irq_num, "cpu": request.cpu }
    })))
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(error) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/irq/v1/interrupt_details", get(interrupt_details))
        .route("/irq/v1/pin_irq", post(pin_irq))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
