//! Cumulative distribution of probe latencies.

use prometheus::{Histogram, HistogramOpts, Registry};

pub const DURATION_HISTOGRAM_NAME: &str = "snmp_response_duration_seconds";
pub const DURATION_HISTOGRAM_HELP: &str = "SNMP packet response latency";

/// Upper bounds in seconds; `+Inf` is implicit.
pub const LATENCY_BUCKETS: [f64; 11] = [
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Every successful probe is observed exactly once. Failed probes are never
/// observed.
#[derive(Clone)]
pub struct LatencyHistogram {
    inner: Histogram,
}

impl LatencyHistogram {
    pub fn new() -> prometheus::Result<Self> {
        let opts = HistogramOpts::new(DURATION_HISTOGRAM_NAME, DURATION_HISTOGRAM_HELP)
            .buckets(LATENCY_BUCKETS.to_vec());
        Ok(Self {
            inner: Histogram::with_opts(opts)?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.inner.clone()))
    }

    pub fn observe(&self, seconds: f64) {
        self.inner.observe(seconds);
    }

    pub fn count(&self) -> u64 {
        self.inner.get_sample_count()
    }

    pub fn sum(&self) -> f64 {
        self.inner.get_sample_sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_sum() {
        let histogram = LatencyHistogram::new().unwrap();
        assert_eq!(histogram.count(), 0);

        for latency in [0.00126, 0.0003, 0.75, 2.5] {
            histogram.observe(latency);
        }
        assert_eq!(histogram.count(), 4);
        assert!((histogram.sum() - 3.25156).abs() < 1e-9);
    }

    #[test]
    fn test_register_once() {
        let registry = Registry::new();
        let histogram = LatencyHistogram::new().unwrap();
        histogram.register(&registry).unwrap();
        assert!(histogram.register(&registry).is_err());
    }
}
