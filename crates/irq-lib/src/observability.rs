//! Observability infrastructure for the IRQ balancer
//!
//! Provides:
//! - Prometheus metrics (report latency, parsed/skipped rows, dispersion, pin outcomes)
//! - Structured JSON logging with tracing

use crate::error::IrqError;
use crate::models::{BalanceReport, PinRequest};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<IrqMetricsInner> = OnceLock::new();

struct IrqMetricsInner {
    report_latency_seconds: Histogram,
    records_parsed: IntGauge,
    lines_skipped: IntCounter,
    dispersion: Gauge,
    pin_requests: IntCounterVec,
    report_errors: IntCounter,
}

impl IrqMetricsInner {
    fn new() -> Self {
        Self {
            report_latency_seconds: register_histogram!(
                "irq_balancer_report_latency_seconds",
                "Time spent loading statistics and building a balance report",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register report_latency_seconds"),

            records_parsed: register_int_gauge!(
                "irq_balancer_records_parsed",
                "Interrupt rows accepted by the last load"
            )
            .expect("Failed to register records_parsed"),

            lines_skipped: register_int_counter!(
                "irq_balancer_lines_skipped_total",
                "Rows of the statistics source that could not be parsed"
            )
            .expect("Failed to register lines_skipped"),

            dispersion: register_gauge!(
                "irq_balancer_dispersion",
                "Standard deviation of per-CPU interrupts in the last report"
            )
            .expect("Failed to register dispersion"),

            pin_requests: register_int_counter_vec!(
                "irq_balancer_pin_requests_total",
                "Pin requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register pin_requests"),

            report_errors: register_int_counter!(
                "irq_balancer_report_errors_total",
                "Reports that failed to load or balance"
            )
            .expect("Failed to register report_errors"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct IrqMetrics {
    _private: (),
}

impl Default for IrqMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(IrqMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &IrqMetricsInner {
        GLOBAL_METRICS.get_or_init(IrqMetricsInner::new)
    }

    pub fn observe_report_latency(&self, duration_secs: f64) {
        self.inner().report_latency_seconds.observe(duration_secs);
    }

    /// Record the outcome of a statistics load
    pub fn record_load(&self, records: usize, skipped_lines: usize) {
        self.inner().records_parsed.set(records as i64);
        self.inner().lines_skipped.inc_by(skipped_lines as u64);
    }

    pub fn set_dispersion(&self, dispersion: f64) {
        self.inner().dispersion.set(dispersion);
    }

    pub fn inc_report_errors(&self) {
        self.inner().report_errors.inc();
    }

    /// Count a pin request under its outcome label
    pub fn record_pin(&self, result: &Result<PinRequest, IrqError>) {
        let outcome = match result {
            Ok(_) => "pinned",
            Err(IrqError::SourceNotFound(_)) => "irq_not_found",
            Err(IrqError::CpuNotFound { .. }) => "cpu_not_found",
            Err(IrqError::PinFailed { .. }) => "write_failed",
            Err(_) => "error",
        };
        self.inner()
            .pin_requests
            .with_label_values(&[outcome])
            .inc();
    }
}

/// Structured logger for balancer events
///
/// Constructed once at startup and handed to whoever needs it.
#[derive(Clone)]
pub struct EventLogger {
    host: String,
}

impl EventLogger {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Log a computed balance report
    pub fn log_report(&self, source: &str, report: &BalanceReport) {
        let strategy = report
            .strategy
            .map(|s| s.name())
            .unwrap_or("current");

        info!(
            event = "report_computed",
            host = %self.host,
            source = %source,
            strategy = %strategy,
            irqs = report.balanced_stats.len(),
            cpus = report.per_cpu_counts.len(),
            total_interrupts = report.total_interrupts(),
            dispersion = report.dispersion_or_sentinel(),
            "Computed interrupt balance report"
        );
    }

    /// Log a failure to build a report
    pub fn log_report_failure(&self, source: &str, error: &IrqError) {
        warn!(
            event = "report_failed",
            host = %self.host,
            source = %source,
            error = %error,
            "Failed to compute interrupt balance report"
        );
    }

    /// Log the result of a pin request
    pub fn log_pin(&self, irq_num: i64, cpu: i64, result: &Result<PinRequest, IrqError>) {
        match result {
            Ok(request) => {
                info!(
                    event = "irq_pinned",
                    host = %self.host,
                    irq = request.irq_num,
                    cpu = request.cpu,
                    "IRQ pinned to CPU"
                );
            }
            Err(error) => {
                warn!(
                    event = "pin_rejected",
                    host = %self.host,
                    irq = irq_num,
                    cpu = cpu,
                    error = %error,
                    "IRQ pin request rejected"
                );
            }
        }
    }

    pub fn log_startup(&self, version: &str, strategy: &str, pin_mode: &str) {
        info!(
            event = "service_started",
            host = %self.host,
            version = %version,
            default_strategy = %strategy,
            pin_mode = %pin_mode,
            "IRQ balancer started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            host = %self.host,
            reason = %reason,
            "IRQ balancer shutting down"
        );
    }
}
