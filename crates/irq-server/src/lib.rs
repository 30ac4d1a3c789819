//! IRQ balancer HTTP service
//!
//! Exposes interrupt distribution reports and single-IRQ pinning over HTTP.

pub mod api;
pub mod config;
