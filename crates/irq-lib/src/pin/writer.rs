//! Affinity writers
//!
//! The only OS side effect of the whole library lives behind
//! [`AffinityWriter`], so it can be swapped for a dry run or a test double.

use crate::error::{IrqError, Result};
use crate::models::IrqId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

/// Applies a single-CPU affinity to an IRQ
#[async_trait]
pub trait AffinityWriter: Send + Sync {
    async fn write_affinity(&self, irq: IrqId, cpu: usize) -> Result<()>;
}

/// Hex mask in the `smp_affinity` format: 32-bit groups, highest first,
/// separated by commas
pub fn cpu_mask(cpu: usize) -> String {
    let group = cpu / 32;
    let bit = cpu % 32;

    let mut mask = format!("{:x}", 1u32 << bit);
    for _ in 0..group {
        mask.push_str(",00000000");
    }
    mask
}

/// Writes masks to `<proc>/irq/<irq>/smp_affinity`
pub struct ProcfsAffinityWriter {
    proc_path: PathBuf,
}

impl ProcfsAffinityWriter {
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
        }
    }
}

#[async_trait]
impl AffinityWriter for ProcfsAffinityWriter {
    async fn write_affinity(&self, irq: IrqId, cpu: usize) -> Result<()> {
        let path = self
            .proc_path
            .join("irq")
            .join(irq.to_string())
            .join("smp_affinity");
        let mask = cpu_mask(cpu);

        fs::write(&path, format!("{}\n", mask))
            .await
            .map_err(|e| IrqError::PinFailed {
                irq,
                reason: format!("write {}: {}", path.display(), e),
            })?;

        tracing::info!(irq, cpu, mask = %mask, "Wrote IRQ affinity");
        Ok(())
    }
}

/// Logs the mask it would write and leaves the system untouched
#[derive(Debug, Default)]
pub struct DryRunAffinityWriter;

#[async_trait]
impl AffinityWriter for DryRunAffinityWriter {
    async fn write_affinity(&self, irq: IrqId, cpu: usize) -> Result<()> {
        tracing::info!(irq, cpu, mask = %cpu_mask(cpu), "Dry run, IRQ affinity not written");
        Ok(())
    }
}

/// How pin requests reach the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinMode {
    #[default]
    DryRun,
    Procfs,
}

impl PinMode {
    pub fn name(&self) -> &'static str {
        match self {
            PinMode::DryRun => "dry-run",
            PinMode::Procfs => "procfs",
        }
    }

    pub fn writer(&self, proc_path: impl Into<PathBuf>) -> Arc<dyn AffinityWriter> {
        match self {
            PinMode::DryRun => Arc::new(DryRunAffinityWriter),
            PinMode::Procfs => Arc::new(ProcfsAffinityWriter::new(proc_path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cpu_mask() {
        assert_eq!(cpu_mask(0), "1");
        assert_eq!(cpu_mask(3), "8");
        assert_eq!(cpu_mask(31), "80000000");
        assert_eq!(cpu_mask(32), "1,00000000");
        assert_eq!(cpu_mask(40), "100,00000000");
        assert_eq!(cpu_mask(70), "40,00000000,00000000");
    }

    #[tokio::test]
    async fn test_procfs_writer_writes_mask() {
        let temp_dir = TempDir::new().unwrap();
        let irq_dir = temp_dir.path().join("irq").join("16");
        fs::create_dir_all(&irq_dir).await.unwrap();

        let writer = ProcfsAffinityWriter::new(temp_dir.path());
        writer.write_affinity(16, 5).await.unwrap();

        let written = fs::read_to_string(irq_dir.join("smp_affinity")).await.unwrap();
        assert_eq!(written, "20\n");
    }

    #[tokio::test]
    async fn test_procfs_writer_failure_is_pin_failed() {
        let temp_dir = TempDir::new().unwrap();

        let writer = ProcfsAffinityWriter::new(temp_dir.path());
        let result = writer.write_affinity(99, 0).await;

        assert!(matches!(result, Err(IrqError::PinFailed { irq: 99, .. })));
    }

    #[tokio::test]
    async fn test_dry_run_writer_succeeds() {
        assert!(DryRunAffinityWriter.write_affinity(1, 1).await.is_ok());
    }
}
