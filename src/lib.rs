//! SNMP Latency Exporter Library
//!
//! Polls a single SNMP agent on wall-clock aligned boundaries, measures the
//! round trip of each GET, and publishes the result for Prometheus:
//!
//! - the latest latency as a timestamped gauge
//! - every latency in a histogram
//! - the device's contact and services as labels of an info metric
//!
//! # Usage
//!
//! ```rust,no_run
//! use prometheus::Registry;
//! use snmp_latency_exporter::{
//!     AlignedScheduler, ClientConfig, ExporterMetrics, LatencyProbe, Poller, ProbeStats,
//!     SampleStore, UdpClient,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! let store = Arc::new(SampleStore::new());
//! let metrics = ExporterMetrics::new(&registry, store.clone())?;
//!
//! let client = UdpClient::connect(&ClientConfig {
//!     target: "192.0.2.10".to_string(),
//!     ..ClientConfig::default()
//! })
//! .await?;
//!
//! let poller = Poller::new(
//!     AlignedScheduler::new(Duration::from_secs(120))?,
//!     LatencyProbe::new(client),
//!     store,
//!     metrics.histogram.clone(),
//!     Arc::new(ProbeStats::new()),
//! );
//! poller.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod error;
pub mod histogram;
pub mod labels;
pub mod metrics;
pub mod poller;
pub mod probe;
pub mod scheduler;
pub mod snmp;
pub mod stats;
pub mod store;

// Re-export main types for convenience
pub use collector::SnmpCollector;
pub use error::{ConfigurationError, PollerError, TransportError};
pub use histogram::{LatencyHistogram, LATENCY_BUCKETS};
pub use labels::{InfoLabels, LabelExtractor};
pub use metrics::{encode_text, ExporterMetrics};
pub use poller::{CycleOutcome, Poller, ProbeErrorPolicy};
pub use probe::{LatencyProbe, ProbeResult};
pub use scheduler::{next_boundary, AlignedScheduler};
pub use snmp::{ClientConfig, ObjectId, SnmpClient, UdpClient, Version};
pub use stats::ProbeStats;
pub use store::{Sample, SampleStore};
