//! Prometheus registry wiring for the exporter.
//!
//! Exposed families:
//! - `snmp_about_info`: gauge 1 labelled with the device's contact and
//!   services plus any static labels
//! - `snmp_response_latency_seconds`: last probe latency, timestamped
//! - `snmp_response_duration_seconds`: latency histogram
//! - `snmp_build_info`: gauge 1 labelled with build metadata

use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::Arc;

use crate::collector::SnmpCollector;
use crate::histogram::LatencyHistogram;
use crate::store::SampleStore;

pub const BUILD_INFO_NAME: &str = "snmp_build_info";

/// Metrics registered on the exporter's registry. Only the histogram is
/// written after registration.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub histogram: LatencyHistogram,
}

impl ExporterMetrics {
    /// Creates and registers all metrics with the registry.
    pub fn new(registry: &Registry, store: Arc<SampleStore>) -> prometheus::Result<Self> {
        let histogram = LatencyHistogram::new()?;
        histogram.register(registry)?;

        registry.register(Box::new(SnmpCollector::new(store)))?;
        registry.register(Box::new(build_info_gauge()?))?;

        Ok(Self { histogram })
    }
}

fn build_info_gauge() -> prometheus::Result<Gauge> {
    let labels: HashMap<String, String> = [
        ("version", env!("CARGO_PKG_VERSION")),
        ("revision", option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")),
        ("branch", option_env!("VERGEN_GIT_BRANCH").unwrap_or("unknown")),
        ("rustversion", option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let gauge = Gauge::with_opts(
        Opts::new(
            BUILD_INFO_NAME,
            "A metric with a constant '1' value labeled by version, revision, branch, and rustversion from which snmp_latency_exporter was built.",
        )
        .const_labels(labels),
    )?;
    gauge.set(1.0);
    Ok(gauge)
}

/// Gathers the registry and renders it in the Prometheus text format.
pub fn encode_text(registry: &Registry) -> prometheus::Result<String> {
    let families = registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
