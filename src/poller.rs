//! The polling loop: wait for a boundary, probe, extract labels, publish.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{PollerError, TransportError};
use crate::histogram::LatencyHistogram;
use crate::labels::{InfoLabels, LabelExtractor};
use crate::probe::LatencyProbe;
use crate::scheduler::AlignedScheduler;
use crate::snmp::{ObjectId, SnmpClient};
use crate::stats::ProbeStats;
use crate::store::{Sample, SampleStore};

/// What a failed probe does to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeErrorPolicy {
    /// Log, keep the previous sample and labels, try again next boundary.
    #[default]
    Skip,
    /// Stop the loop with the error.
    Exit,
}

impl fmt::Display for ProbeErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeErrorPolicy::Skip => write!(f, "skip"),
            ProbeErrorPolicy::Exit => write!(f, "exit"),
        }
    }
}

/// Result of one cycle that did not stop the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Updated {
        latency_seconds: f64,
        labels: usize,
        unmatched: usize,
    },
    Skipped,
}

/// Owns one device's polling state. Only the poller writes to the store and
/// the histogram.
pub struct Poller<C> {
    scheduler: AlignedScheduler,
    probe: LatencyProbe<C>,
    extractor: LabelExtractor,
    oids: Vec<ObjectId>,
    static_labels: InfoLabels,
    policy: ProbeErrorPolicy,
    store: Arc<SampleStore>,
    histogram: LatencyHistogram,
    stats: Arc<ProbeStats>,
}

impl<C: SnmpClient> Poller<C> {
    /// Polls the default label OIDs with the default extractor and skips
    /// failed cycles.
    pub fn new(
        scheduler: AlignedScheduler,
        probe: LatencyProbe<C>,
        store: Arc<SampleStore>,
        histogram: LatencyHistogram,
        stats: Arc<ProbeStats>,
    ) -> Self {
        let extractor = LabelExtractor::default();
        let oids = extractor.oids();
        Self {
            scheduler,
            probe,
            extractor,
            oids,
            static_labels: InfoLabels::new(),
            policy: ProbeErrorPolicy::default(),
            store,
            histogram,
            stats,
        }
    }

    pub fn with_extractor(mut self, extractor: LabelExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// OIDs requested each cycle. An empty list falls back to the
    /// extractor's OIDs.
    pub fn with_oids(mut self, oids: Vec<ObjectId>) -> Self {
        self.oids = if oids.is_empty() {
            self.extractor.oids()
        } else {
            oids
        };
        self
    }

    /// Labels added to every info snapshot. Extracted labels win on
    /// collision.
    pub fn with_static_labels(mut self, labels: InfoLabels) -> Self {
        self.static_labels = labels;
        self
    }

    pub fn with_policy(mut self, policy: ProbeErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn oids(&self) -> &[ObjectId] {
        &self.oids
    }

    /// Probes once and publishes the result.
    ///
    /// Under [`ProbeErrorPolicy::Skip`] a failed probe leaves the store and
    /// histogram untouched and yields [`CycleOutcome::Skipped`].
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleOutcome, TransportError> {
        let result = match self.probe.probe(&self.oids).await {
            Ok(result) => result,
            Err(e) => {
                self.stats.record_failure(chrono::Utc::now(), &e.to_string());
                return match self.policy {
                    ProbeErrorPolicy::Skip => {
                        warn!("Probe failed, keeping previous sample: {}", e);
                        Ok(CycleOutcome::Skipped)
                    }
                    ProbeErrorPolicy::Exit => Err(e),
                };
            }
        };

        let latency_seconds = result.latency_seconds();
        self.histogram.observe(latency_seconds);

        if let Err(e) = self.store.update_sample(Sample {
            latency_seconds,
            observed_at: result.observed_at,
        }) {
            error!("Failed to publish latency sample: {}", e);
        }

        let (extracted, unmatched) = self.extractor.extract_counted(&result.variables);
        let mut labels = self.static_labels.clone();
        labels.extend(extracted);
        let label_count = labels.len();
        if let Err(e) = self.store.update_labels(labels) {
            error!("Failed to publish info labels: {}", e);
        }

        self.stats.record_success(result.observed_at, unmatched);
        debug!(
            "Cycle complete: latency {:.6}s, {} labels, {} unmatched",
            latency_seconds, label_count, unmatched
        );

        Ok(CycleOutcome::Updated {
            latency_seconds,
            labels: label_count,
            unmatched,
        })
    }

    /// Runs cycles on every boundary until a cycle fails under
    /// [`ProbeErrorPolicy::Exit`].
    pub async fn run(&self) -> Result<(), PollerError> {
        info!(
            "Polling {} OIDs every {:?} (on error: {})",
            self.oids.len(),
            self.scheduler.interval(),
            self.policy
        );

        loop {
            let boundary = self.scheduler.wait().await?;
            debug!("Boundary {} reached", boundary);
            self.run_cycle().await?;
        }
    }
}
