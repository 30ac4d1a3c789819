//! Core data models for interrupt statistics and balance reports

use crate::balance::BalanceStrategy;
use crate::error::IrqError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Interrupt request line number as reported by the kernel
pub type IrqId = u32;

/// Sum of interrupt counters, clamped at `u64::MAX`
pub(crate) fn saturating_sum(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().fold(0, u64::saturating_add)
}

/// One row of per-CPU interrupt counters
///
/// `total` is always the sum of `per_cpu_counts` (clamped at `u64::MAX`,
/// the parser never produces a row that needs it); the fields are private so
/// the only way to build a record is through [`InterruptRecord::new`] or
/// [`InterruptRecord::pinned_to`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterruptRecord {
    /// Serialized as a JSON number
    #[serde(rename = "irq_num")]
    irq: IrqId,
    #[serde(rename = "irq_device")]
    device: String,
    irq_type: String,
    #[serde(rename = "cpu_interrupts")]
    per_cpu_counts: Vec<u64>,
    #[serde(rename = "cpu_interrupt_total")]
    total: u64,
}

impl InterruptRecord {
    pub fn new(
        irq: IrqId,
        irq_type: impl Into<String>,
        device: impl Into<String>,
        per_cpu_counts: Vec<u64>,
    ) -> Self {
        let total = saturating_sum(per_cpu_counts.iter().copied());
        Self {
            irq,
            device: device.into(),
            irq_type: irq_type.into(),
            per_cpu_counts,
            total,
        }
    }

    pub fn irq(&self) -> IrqId {
        self.irq
    }

    pub fn irq_type(&self) -> &str {
        &self.irq_type
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn per_cpu_counts(&self) -> &[u64] {
        &self.per_cpu_counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Derive a record whose whole load sits on `cpu`
    ///
    /// The result has exactly `cpu_count` columns, all zero except `cpu`.
    pub fn pinned_to(&self, cpu: usize, cpu_count: usize) -> Self {
        let mut per_cpu_counts = vec![0; cpu_count];
        if let Some(slot) = per_cpu_counts.get_mut(cpu) {
            *slot = self.total;
        }
        Self::new(
            self.irq,
            self.irq_type.clone(),
            self.device.clone(),
            per_cpu_counts,
        )
    }
}

/// A relocation directive, rendered as `pin <irq> to CPU<cpu>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinInstruction {
    pub irq: IrqId,
    pub cpu: usize,
}

impl fmt::Display for PinInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin {} to CPU{}", self.irq, self.cpu)
    }
}

impl FromStr for PinInstruction {
    type Err = IrqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IrqError::InvalidInstruction(s.to_string());
        let parts: Vec<&str> = s.split_whitespace().collect();

        match parts.as_slice() {
            ["pin", irq, "to", cpu] => {
                let irq = irq.parse().map_err(|_| invalid())?;
                let cpu = cpu
                    .strip_prefix("CPU")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(invalid)?;
                Ok(Self { irq, cpu })
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for PinInstruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Interrupt share of a single CPU
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuShare {
    pub cpu: String,
    pub interrupts: u64,
    pub percent: f64,
}

/// Outcome of a balancing run (or of the current, unbalanced state)
#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    /// Strategy that produced the report; `None` for the as-parsed state
    pub strategy: Option<BalanceStrategy>,
    pub balanced_stats: Vec<InterruptRecord>,
    pub instructions: Vec<PinInstruction>,
    pub per_cpu_counts: Vec<u64>,
    pub per_cpu_percent: Vec<f64>,
    /// Sample standard deviation of `per_cpu_counts`
    pub dispersion: Option<f64>,
}

impl BalanceReport {
    /// Sentinel reported on the wire when dispersion is undefined
    pub const UNDEFINED_DISPERSION: f64 = -1.0;

    pub fn total_interrupts(&self) -> u64 {
        saturating_sum(self.per_cpu_counts.iter().copied())
    }

    pub fn dispersion_or_sentinel(&self) -> f64 {
        self.dispersion.unwrap_or(Self::UNDEFINED_DISPERSION)
    }

    pub fn cpus(&self) -> Vec<CpuShare> {
        self.per_cpu_counts
            .iter()
            .zip(&self.per_cpu_percent)
            .enumerate()
            .map(|(i, (&interrupts, &percent))| CpuShare {
                cpu: format!("CPU{}", i),
                interrupts,
                percent,
            })
            .collect()
    }
}

/// A validated (irq, cpu) pair that was handed to the affinity writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinRequest {
    pub irq_num: IrqId,
    pub cpu: usize,
}
