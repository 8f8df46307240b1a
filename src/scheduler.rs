//! Wall-clock aligned scheduling.
//!
//! Probes fire on exact multiples of the poll interval counted from the Unix
//! epoch, so independent exporters polling different devices with the same
//! interval produce samples on the same instants, and a slow probe can never
//! make the next one start early.

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use tracing::trace;

use crate::error::ConfigurationError;

/// Returns the first boundary strictly after `now`.
///
/// When `now` sits exactly on a boundary the following one is returned, so
/// consecutive calls always make progress.
pub fn next_boundary(
    now: DateTime<Utc>,
    interval: Duration,
) -> Result<DateTime<Utc>, ConfigurationError> {
    let step = i64::try_from(interval.as_nanos())
        .ok()
        .filter(|n| *n > 0)
        .ok_or(ConfigurationError::InvalidInterval(interval))?;

    let out_of_range =
        || ConfigurationError::Invalid(format!("clock value {now} is outside the schedulable range"));
    let now_ns = now.timestamp_nanos_opt().ok_or_else(out_of_range)?;
    let next_ns = (now_ns - now_ns.rem_euclid(step))
        .checked_add(step)
        .ok_or_else(out_of_range)?;

    Ok(Utc.timestamp_nanos(next_ns))
}

/// Sleeps until the next aligned boundary and returns it.
pub async fn wait_until_next_boundary(
    interval: Duration,
) -> Result<DateTime<Utc>, ConfigurationError> {
    let boundary = next_boundary(Utc::now(), interval)?;
    sleep_until(boundary).await;
    Ok(boundary)
}

async fn sleep_until(boundary: DateTime<Utc>) {
    // The tokio timer runs on the monotonic clock; re-check the wall clock so
    // we never return a hair before the boundary.
    loop {
        let remaining = boundary - Utc::now();
        match remaining.to_std() {
            Ok(d) if !d.is_zero() => {
                trace!("Sleeping {:?} until {}", d, boundary);
                tokio::time::sleep(d).await;
            }
            _ => return,
        }
    }
}

/// A validated poll interval.
#[derive(Debug, Clone, Copy)]
pub struct AlignedScheduler {
    interval: Duration,
}

impl AlignedScheduler {
    /// Fails with [`ConfigurationError::InvalidInterval`] for a zero interval
    /// or one too large to express in nanoseconds.
    pub fn new(interval: Duration) -> Result<Self, ConfigurationError> {
        next_boundary(Utc.timestamp_nanos(0), interval)?;
        Ok(Self { interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&self) -> Result<DateTime<Utc>, ConfigurationError> {
        wait_until_next_boundary(self.interval).await
    }
}
