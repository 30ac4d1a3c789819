//! Core library for interrupt (IRQ) balancing
//!
//! This crate provides the core functionality for:
//! - Parsing `/proc/interrupts`-style statistics
//! - Balancing interrupt sources across CPUs with several greedy heuristics
//! - Building distribution reports with a dispersion metric
//! - Pinning a single IRQ to a CPU through a pluggable affinity writer
//! - Metrics and structured event logging

pub mod balance;
pub mod collector;
pub mod error;
pub mod models;
pub mod observability;
pub mod pin;

pub use balance::{compare_strategies, BalanceStrategy};
pub use collector::StatCollection;
pub use error::IrqError;
pub use models::*;
pub use observability::{EventLogger, IrqMetrics};
pub use pin::{AffinityPinner, AffinityWriter, PinMode};
