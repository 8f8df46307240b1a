//! Metrics endpoint handler for Prometheus scraping.
//!
//! Scrapes never trigger a probe; they render whatever the poller last
//! published.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use snmp_latency_exporter::encode_text;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<impl IntoResponse, MetricsError> {
    debug!("Processing /metrics request");

    let body = encode_text(&state.registry).map_err(|e| {
        error!("Failed to encode Prometheus metrics: {}", e);
        MetricsError::EncodingFailed
    })?;

    Ok((
        [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
