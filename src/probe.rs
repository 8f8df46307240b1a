//! One timed request/response exchange with the device.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::TransportError;
use crate::snmp::{ObjectId, SnmpClient, VarBind};

/// Outcome of a successful probe.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub variables: Vec<VarBind>,
    /// Wire round trip of the exchange.
    pub latency: Duration,
    /// Wall-clock time the response arrived.
    pub observed_at: DateTime<Utc>,
}

impl ProbeResult {
    pub fn latency_seconds(&self) -> f64 {
        self.latency.as_secs_f64()
    }
}

/// Wraps an [`SnmpClient`] and turns each GET into a latency sample.
pub struct LatencyProbe<C> {
    client: C,
}

impl<C: SnmpClient> LatencyProbe<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    #[instrument(skip(self, oids), fields(oids = oids.len()))]
    pub async fn probe(&self, oids: &[ObjectId]) -> Result<ProbeResult, TransportError> {
        let response = self.client.get(oids).await?;

        debug!(
            "Probe answered in {:.6}s with {} variables",
            response.round_trip.as_secs_f64(),
            response.variables.len()
        );

        Ok(ProbeResult {
            variables: response.variables,
            latency: response.round_trip,
            observed_at: response.received_at,
        })
    }
}
