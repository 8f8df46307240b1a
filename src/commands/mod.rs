//! CLI command implementations for snmp-latency-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `config`: Configuration file generation
//! - `probe`: One-off probes against the configured target

pub mod config;
pub mod probe;

// Re-export command functions
pub use config::command_config;
pub use probe::command_probe;
