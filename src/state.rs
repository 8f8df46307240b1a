//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers. The poller owns its own handles to the same store and
//! statistics.

use prometheus::Registry;
use snmp_latency_exporter::{ExporterMetrics, ProbeStats, SampleStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub metrics: ExporterMetrics,
    pub store: Arc<SampleStore>,
    pub probe_stats: Arc<ProbeStats>,
    pub config: Arc<Config>,
    /// Agent address as configured, for display.
    pub target: String,
    pub poll_interval: Duration,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
