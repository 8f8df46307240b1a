//! Last-known latency sample and info labels, shared between the poller and
//! scrapes.
//!
//! Each slot holds an immutable snapshot that bundles the value with the
//! metric family rendered from it and its descriptor. The poller swaps in a
//! whole new snapshot per cycle, so a scrape sees either the previous or the
//! next snapshot, never a mix. The two slots are independent: a scrape racing
//! an update may pair the new latency with the previous labels.

use chrono::{DateTime, Utc};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, Opts};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::labels::InfoLabels;

pub const LATENCY_GAUGE_NAME: &str = "snmp_response_latency_seconds";
pub const LATENCY_GAUGE_HELP: &str = "SNMP packet response latency";
pub const INFO_NAME: &str = "snmp_about_info";
pub const INFO_HELP: &str = "SNMP narrative metric with a default value of 1";

/// One latency measurement and the instant it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub latency_seconds: f64,
    pub observed_at: DateTime<Utc>,
}

struct Snapshot<T> {
    value: T,
    descs: Vec<Desc>,
    families: Vec<MetricFamily>,
}

impl<T> Snapshot<T> {
    fn from_gauge(value: T, gauge: &Gauge) -> Self {
        Self {
            value,
            descs: gauge.desc().into_iter().cloned().collect(),
            families: gauge.collect(),
        }
    }
}

type Slot<T> = RwLock<Option<Arc<Snapshot<T>>>>;

/// Process-wide sample state. Written by the poller only.
#[derive(Default)]
pub struct SampleStore {
    latency: Slot<Sample>,
    info: Slot<InfoLabels>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the latency sample. The gauge carries `observed_at` as its
    /// explicit timestamp.
    pub fn update_sample(&self, sample: Sample) -> prometheus::Result<()> {
        let gauge = Gauge::with_opts(Opts::new(LATENCY_GAUGE_NAME, LATENCY_GAUGE_HELP))?;
        gauge.set(sample.latency_seconds);

        let mut snapshot = Snapshot::from_gauge(sample, &gauge);
        let timestamp_ms = sample.observed_at.timestamp_millis();
        for family in &mut snapshot.families {
            for metric in family.mut_metric().iter_mut() {
                metric.set_timestamp_ms(timestamp_ms);
            }
        }

        replace(&self.latency, snapshot);
        Ok(())
    }

    /// Replaces the info labels wholesale; the descriptor is rebuilt so its
    /// label names are exactly the keys of `labels`.
    pub fn update_labels(&self, labels: InfoLabels) -> prometheus::Result<()> {
        let const_labels: HashMap<String, String> = labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let gauge = Gauge::with_opts(Opts::new(INFO_NAME, INFO_HELP).const_labels(const_labels))?;
        gauge.set(1.0);

        replace(&self.info, Snapshot::from_gauge(labels, &gauge));
        Ok(())
    }

    pub fn current_sample(&self) -> Option<Sample> {
        read(&self.latency).map(|s| s.value)
    }

    pub fn current_labels(&self) -> Option<InfoLabels> {
        read(&self.info).map(|s| s.value.clone())
    }

    /// Descriptors of the populated slots only.
    pub fn describe(&self) -> Vec<Desc> {
        let mut descs = Vec::new();
        if let Some(s) = read(&self.latency) {
            descs.extend(s.descs.iter().cloned());
        }
        if let Some(s) = read(&self.info) {
            descs.extend(s.descs.iter().cloned());
        }
        descs
    }

    /// Metric families of the populated slots only.
    pub fn families(&self) -> Vec<MetricFamily> {
        let mut families = Vec::new();
        if let Some(s) = read(&self.latency) {
            families.extend(s.families.iter().cloned());
        }
        if let Some(s) = read(&self.info) {
            families.extend(s.families.iter().cloned());
        }
        families
    }
}

fn replace<T>(slot: &Slot<T>, snapshot: Snapshot<T>) {
    let mut guard = slot.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Arc::new(snapshot));
}

fn read<T>(slot: &Slot<T>) -> Option<Arc<Snapshot<T>>> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use prometheus::{Encoder, TextEncoder};

    fn render(families: &[MetricFamily]) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn labels(pairs: &[(&str, &str)]) -> InfoLabels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_store_describes_nothing() {
        let store = SampleStore::new();
        assert!(store.current_sample().is_none());
        assert!(store.current_labels().is_none());
        assert!(store.describe().is_empty());
        assert!(store.families().is_empty());
    }

    #[test]
    fn test_sample_replaced_wholesale() {
        let store = SampleStore::new();
        let first = Sample {
            latency_seconds: 0.002,
            observed_at: Utc.timestamp_opt(1_609_697_880, 0).unwrap(),
        };
        let second = Sample {
            latency_seconds: 0.00126,
            observed_at: Utc.timestamp_opt(1_609_698_000, 1_000_000).unwrap(),
        };

        store.update_sample(first).unwrap();
        store.update_sample(second).unwrap();
        assert_eq!(store.current_sample(), Some(second));

        let descs = store.describe();
        assert_eq!(descs.len(), 1);
        assert_eq!(descs[0].fq_name, LATENCY_GAUGE_NAME);
    }

    #[test]
    fn test_latency_family_carries_timestamp() {
        let store = SampleStore::new();
        store
            .update_sample(Sample {
                latency_seconds: 0.00126,
                observed_at: Utc.timestamp_opt(1_609_697_880, 1_000_000).unwrap(),
            })
            .unwrap();

        let families = store.families();
        assert_eq!(families.len(), 1);
        assert!(render(&families).contains("snmp_response_latency_seconds 0.00126 1609697880001\n"));
    }

    #[test]
    fn test_labels_descriptor_follows_current_keys() {
        let store = SampleStore::new();
        store
            .update_labels(labels(&[("contact", "noc"), ("sysServices", "1001110")]))
            .unwrap();
        store.update_labels(labels(&[("sysServices", "1001000")])).unwrap();

        assert_eq!(store.current_labels(), Some(labels(&[("sysServices", "1001000")])));

        let descs = store.describe();
        assert_eq!(descs.len(), 1);
        assert_eq!(descs[0].fq_name, INFO_NAME);
        assert!(render(&store.families()).contains("snmp_about_info{sysServices=\"1001000\"} 1\n"));
    }

    #[test]
    fn test_invalid_label_name_is_rejected() {
        let store = SampleStore::new();
        assert!(store.update_labels(labels(&[("not-a-label", "x")])).is_err());
        assert!(store.current_labels().is_none());
    }
}
