//! Diagnostics module for error collection and reporting

mod blocks;
mod collector;

pub use blocks::collect_block_diagnostics;
pub use collector::{DiagnosticCollector, DIAGNOSTIC_SOURCE};
