//! Error kinds for interrupt statistics, balancing and pinning
//!
//! Malformed lines in the statistics source are not errors; the loader drops
//! them. Everything else a caller can observe is one of these variants.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by the loader, the balancers and the pinner
#[derive(Debug, Error)]
pub enum IrqError {
    /// The statistics source could not be read
    #[error("interrupt statistics source {} unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The interrupt source is not part of the OS-reported IRQ set
    #[error("IRQ {0} not found")]
    SourceNotFound(i64),

    /// The CPU index is outside the CPUs reported by the OS
    #[error("CPU {cpu} not found ({available} CPUs available)")]
    CpuNotFound { cpu: i64, available: usize },

    /// The affinity write was rejected or is unsupported
    #[error("unable to pin IRQ {irq}: {reason}")]
    PinFailed { irq: u32, reason: String },

    /// Balancing was requested without any CPU to assign load to
    #[error("cannot balance {load} interrupts across zero CPUs")]
    NoCapacity { load: u64 },

    #[error("unknown balance strategy '{0}'")]
    UnknownStrategy(String),

    #[error("invalid pin instruction '{0}'")]
    InvalidInstruction(String),
}

impl IrqError {
    /// True when the OS refused a pin request
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            IrqError::SourceNotFound(_) | IrqError::CpuNotFound { .. } | IrqError::PinFailed { .. }
        )
    }
}

pub type Result<T, E = IrqError> = std::result::Result<T, E>;
