//! Line parser for `/proc/interrupts`-style tables
//!
//! A data row looks like:
//!
//! ```text
//!  16:    120    45   IO-APIC-edge      eth0
//! ```
//!
//! The identifier before the colon is the IRQ number, the leading numeric
//! tokens after it are per-CPU counters and the last two tokens are the
//! interrupt type and the owning device.

use crate::models::{InterruptRecord, IrqId};

/// Parse one data row
///
/// Returns `None` for summary rows (`NMI:`, `LOC:`, `ERR:` ...) and for
/// anything that does not have the expected shape.
pub fn parse_line(line: &str) -> Option<InterruptRecord> {
    let (id, rest) = line.split_once(':')?;
    let id = id.trim();

    if id.is_empty() || id.contains(char::is_whitespace) {
        return None;
    }
    if id.starts_with(|c: char| c.is_alphabetic()) {
        return None;
    }
    let irq: IrqId = id.parse().ok()?;

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let column_count = tokens
        .iter()
        .take_while(|t| t.parse::<u64>().is_ok())
        .count();
    let (columns, trailing) = tokens.split_at(column_count);

    let [.., irq_type, device] = trailing else {
        return None;
    };

    let per_cpu_counts = columns
        .iter()
        .map(|t| t.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    // A row whose counters do not fit a u64 total is not trusted
    per_cpu_counts
        .iter()
        .try_fold(0u64, |total, &count| total.checked_add(count))?;

    Some(InterruptRecord::new(irq, *irq_type, *device, per_cpu_counts))
}

/// Count the `CPUn` columns announced by a header line
pub fn count_header_cpus(header: &str) -> usize {
    header
        .split_whitespace()
        .filter(|t| t.starts_with("CPU"))
        .count()
}
