//! Probe cycle statistics for the health endpoint.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock as StdRwLock;
use std::time::Instant;

/// Counters fed by the poller, read by `/health`.
pub struct ProbeStats {
    pub success_count: AtomicU64,
    pub failure_count: AtomicU64,
    pub unmatched_fields: AtomicU64,
    last_cycle_ok: AtomicBool,
    last_success: StdRwLock<Option<DateTime<Utc>>>,
    last_failure: StdRwLock<Option<(DateTime<Utc>, String)>>,
    pub start_time: Instant,
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self {
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            unmatched_fields: AtomicU64::new(0),
            last_cycle_ok: AtomicBool::new(false),
            last_success: StdRwLock::new(None),
            last_failure: StdRwLock::new(None),
            start_time: Instant::now(),
        }
    }
}

impl ProbeStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_success(&self, at: DateTime<Utc>, unmatched: usize) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.unmatched_fields
            .fetch_add(unmatched as u64, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_success.write() {
            *guard = Some(at);
        }
        self.last_cycle_ok.store(true, Ordering::Release);
    }

    pub fn record_failure(&self, at: DateTime<Utc>, error: &str) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_failure.write() {
            *guard = Some((at, error.to_string()));
        }
        self.last_cycle_ok.store(false, Ordering::Release);
    }

    /// True once a probe has succeeded and the latest cycle did not fail.
    pub fn is_healthy(&self) -> bool {
        self.last_cycle_ok.load(Ordering::Acquire)
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success.read().ok().and_then(|g| *g)
    }

    pub fn last_failure(&self) -> Option<(DateTime<Utc>, String)> {
        self.last_failure.read().ok().and_then(|g| g.clone())
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let success = self.success_count.load(Ordering::Relaxed);
        let failure = self.failure_count.load(Ordering::Relaxed);
        let unmatched = self.unmatched_fields.load(Ordering::Relaxed);

        let fmt_time = |t: DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::Millis, true);
        let last_success = self
            .last_success()
            .map(fmt_time)
            .unwrap_or_else(|| "N/A".to_string());

        let mut out = String::new();
        let _ = writeln!(out, "{:<24} {:>12}", "successful probes", success);
        let _ = writeln!(out, "{:<24} {:>12}", "failed probes", failure);
        let _ = writeln!(out, "{:<24} {:>12}", "unmatched fields", unmatched);
        let _ = writeln!(out, "{:<24} {}", "last success", last_success);
        if let Some((at, error)) = self.last_failure() {
            let _ = writeln!(out, "{:<24} {}", "last failure", fmt_time(at));
            let _ = writeln!(out, "{:<24} {}", "last error", error);
        }
        out
    }
}
