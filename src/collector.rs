//! Scrape-time view of the [`SampleStore`].

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use std::sync::Arc;

use crate::store::SampleStore;

/// Emits the latency gauge and the info metric, whichever are populated.
///
/// The info metric's label set changes with each poll, so the collector
/// registers without fixed descriptors and relies on the registry to skip its
/// consistency checks. [`describe`](Self::describe) reports what the next
/// collect will emit.
#[derive(Clone)]
pub struct SnmpCollector {
    store: Arc<SampleStore>,
}

impl SnmpCollector {
    pub fn new(store: Arc<SampleStore>) -> Self {
        Self { store }
    }

    /// Descriptors of the populated metrics, latency first.
    pub fn describe(&self) -> Vec<Desc> {
        self.store.describe()
    }
}

impl Collector for SnmpCollector {
    fn desc(&self) -> Vec<&Desc> {
        Vec::new()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.store.families()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Sample, INFO_NAME, LATENCY_GAUGE_NAME};
    use chrono::Utc;

    #[test]
    fn test_collects_nothing_before_first_probe() {
        let collector = SnmpCollector::new(Arc::new(SampleStore::new()));
        assert!(collector.describe().is_empty());
        assert!(collector.collect().is_empty());
    }

    #[test]
    fn test_describe_matches_collect() {
        let store = Arc::new(SampleStore::new());
        let collector = SnmpCollector::new(store.clone());

        store
            .update_sample(Sample {
                latency_seconds: 0.004,
                observed_at: Utc::now(),
            })
            .unwrap();
        assert_eq!(collector.describe().len(), 1);
        assert_eq!(collector.collect().len(), 1);

        store
            .update_labels([("contact".to_string(), "noc".to_string())].into())
            .unwrap();
        let names: Vec<String> = collector.describe().into_iter().map(|d| d.fq_name).collect();
        assert_eq!(names, vec![LATENCY_GAUGE_NAME, INFO_NAME]);
        assert_eq!(collector.collect().len(), 2);
    }

    #[test]
    fn test_concurrent_collect_sees_whole_snapshots() {
        use chrono::TimeZone;
        use prometheus::{Encoder, TextEncoder};
        use std::sync::atomic::{AtomicBool, Ordering};

        const BASE_MS: i64 = 1_609_697_880_000;
        const UPDATES: i64 = 2_000;

        let store = Arc::new(SampleStore::new());
        let collector = SnmpCollector::new(store.clone());
        let done = AtomicBool::new(false);

        let reads: usize = std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 1..=UPDATES {
                    store
                        .update_sample(Sample {
                            latency_seconds: i as f64 / 1000.0,
                            observed_at: Utc.timestamp_millis_opt(BASE_MS + i).unwrap(),
                        })
                        .unwrap();
                    store
                        .update_labels(
                            [
                                ("contact".to_string(), format!("c{i}")),
                                ("sysServices".to_string(), format!("s{i}")),
                            ]
                            .into(),
                        )
                        .unwrap();
                }
                done.store(true, Ordering::SeqCst);
            });

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        let mut reads = 0;
                        loop {
                            let finished = done.load(Ordering::SeqCst);
                            let mut buffer = Vec::new();
                            TextEncoder::new()
                                .encode(&collector.collect(), &mut buffer)
                                .unwrap();
                            let text = String::from_utf8(buffer).unwrap();

                            for line in text.lines() {
                                if let Some(rest) = line.strip_prefix("snmp_response_latency_seconds ") {
                                    let mut fields = rest.split(' ');
                                    let value: f64 = fields.next().unwrap().parse().unwrap();
                                    let timestamp: i64 = fields.next().unwrap().parse().unwrap();
                                    assert_eq!(
                                        (value * 1000.0).round() as i64,
                                        timestamp - BASE_MS,
                                        "torn sample: {line}"
                                    );
                                } else if line.starts_with("snmp_about_info{") {
                                    let quoted: Vec<&str> = line.split('"').collect();
                                    assert_eq!(
                                        quoted[1].trim_start_matches('c'),
                                        quoted[3].trim_start_matches('s'),
                                        "torn labels: {line}"
                                    );
                                }
                            }
                            reads += 1;
                            if finished {
                                break reads;
                            }
                        }
                    })
                })
                .collect();

            readers.into_iter().map(|r| r.join().unwrap()).sum()
        });

        assert!(reads > 0);
        assert_eq!(store.current_sample().unwrap().latency_seconds, 2.0);
    }
}
