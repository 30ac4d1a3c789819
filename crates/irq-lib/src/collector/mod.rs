//! Interrupt statistics collection
//!
//! Reads `/proc/interrupts`-style tables into [`StatCollection`]s. Parsing
//! is tolerant: a row that does not look like an interrupt counter row is
//! dropped, it never aborts the whole load.

mod loader;
mod parser;

#[cfg(test)]
mod tests;

pub use loader::StatCollection;
pub use parser::{count_header_cpus, parse_line};

/// Statistics source used when none is configured
pub const DEFAULT_INTERRUPTS_FILE: &str = "proc_interrupts.txt";
