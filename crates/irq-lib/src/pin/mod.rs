//! Pinning a single IRQ to a CPU
//!
//! Preconditions are checked against the OS view under the proc root
//! (`/proc/irq/<n>` must exist, the CPU must be one of the `CPUn` columns of
//! `/proc/interrupts`) before the write is handed to an [`AffinityWriter`].
//! Pinning is independent of balancing: nothing here consumes a report.

mod writer;

pub use writer::{cpu_mask, AffinityWriter, DryRunAffinityWriter, PinMode, ProcfsAffinityWriter};

use crate::collector::count_header_cpus;
use crate::error::{IrqError, Result};
use crate::models::{IrqId, PinRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

/// Validates pin requests and forwards them to a writer
pub struct AffinityPinner {
    proc_path: PathBuf,
    writer: Arc<dyn AffinityWriter>,
}

impl AffinityPinner {
    /// Create a pinner checking against the real `/proc`
    pub fn new(writer: Arc<dyn AffinityWriter>) -> Self {
        Self::with_proc_path("/proc", writer)
    }

    /// Create pinner with custom proc path (for testing)
    pub fn with_proc_path(proc_path: impl Into<PathBuf>, writer: Arc<dyn AffinityWriter>) -> Self {
        Self {
            proc_path: proc_path.into(),
            writer,
        }
    }

    /// Whether the OS reports an IRQ with this number
    pub async fn irq_exists(&self, irq: IrqId) -> bool {
        let irq_dir = self.proc_path.join("irq").join(irq.to_string());
        fs::metadata(&irq_dir).await.is_ok()
    }

    /// Number of CPUs announced by the interrupts table header
    pub async fn online_cpu_count(&self) -> Result<usize> {
        let path = self.proc_path.join("interrupts");
        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| IrqError::SourceUnavailable { path, source })?;

        Ok(content.lines().next().map(count_header_cpus).unwrap_or(0))
    }

    /// Pin `irq_num` to `cpu`
    ///
    /// Fails with `SourceNotFound` for an unknown IRQ, then `CpuNotFound` for
    /// a CPU outside `[0, online)`. `PinFailed` covers an unreadable CPU
    /// list and a rejected write.
    pub async fn pin(&self, irq_num: i64, cpu: i64) -> Result<PinRequest> {
        let irq = IrqId::try_from(irq_num).map_err(|_| IrqError::SourceNotFound(irq_num))?;
        if !self.irq_exists(irq).await {
            return Err(IrqError::SourceNotFound(irq_num));
        }

        let available = self
            .online_cpu_count()
            .await
            .map_err(|e| IrqError::PinFailed {
                irq,
                reason: e.to_string(),
            })?;
        let cpu_index = usize::try_from(cpu)
            .ok()
            .filter(|&c| c < available)
            .ok_or(IrqError::CpuNotFound { cpu, available })?;

        self.writer.write_affinity(irq, cpu_index).await?;

        tracing::debug!(irq, cpu = cpu_index, "IRQ pinned");
        Ok(PinRequest {
            irq_num: irq,
            cpu: cpu_index,
        })
    }
}
