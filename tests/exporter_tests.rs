//! End-to-end tests of the polling core against a scripted SNMP client,
//! asserting on the rendered Prometheus text.

use chrono::{TimeZone, Utc};
use prometheus::Registry;
use snmp_latency_exporter::labels::{sys_contact, sys_services};
use snmp_latency_exporter::snmp::{GetResponse, Value, VarBind};
use snmp_latency_exporter::{
    encode_text, AlignedScheduler, CycleOutcome, ExporterMetrics, LatencyProbe, ObjectId, Poller,
    ProbeStats, SampleStore, SnmpClient, TransportError, LATENCY_BUCKETS,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedClient {
    replies: Mutex<Vec<Result<GetResponse, TransportError>>>,
}

impl ScriptedClient {
    fn new(mut replies: Vec<Result<GetResponse, TransportError>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }
}

impl SnmpClient for ScriptedClient {
    async fn get(&self, _oids: &[ObjectId]) -> Result<GetResponse, TransportError> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(TransportError::NoOids))
    }
}

fn reply(micros: u64, contact: &str, services: i64) -> Result<GetResponse, TransportError> {
    Ok(GetResponse {
        variables: vec![
            VarBind::new(sys_contact(), Value::OctetString(contact.as_bytes().to_vec())),
            VarBind::new(sys_services(), Value::Integer(services)),
        ],
        round_trip: Duration::from_micros(micros),
        received_at: Utc.timestamp_opt(1_609_697_880, 1_000_000).unwrap(),
    })
}

struct Exporter {
    registry: Registry,
    poller: Poller<ScriptedClient>,
}

fn exporter(replies: Vec<Result<GetResponse, TransportError>>) -> Exporter {
    let registry = Registry::new();
    let store = Arc::new(SampleStore::new());
    let metrics = ExporterMetrics::new(&registry, store.clone()).unwrap();
    let poller = Poller::new(
        AlignedScheduler::new(Duration::from_secs(120)).unwrap(),
        LatencyProbe::new(ScriptedClient::new(replies)),
        store,
        metrics.histogram.clone(),
        Arc::new(ProbeStats::new()),
    );
    Exporter { registry, poller }
}

fn scrape(exporter: &Exporter) -> String {
    encode_text(&exporter.registry).unwrap()
}

/// Cumulative bucket counts in exposition order, `+Inf` last.
fn bucket_counts(text: &str) -> Vec<u64> {
    text.lines()
        .filter(|l| l.starts_with("snmp_response_duration_seconds_bucket"))
        .map(|l| l.rsplit(' ').next().unwrap().parse().unwrap())
        .collect()
}

#[test]
fn test_scrape_before_first_probe() {
    let exporter = exporter(vec![]);
    let text = scrape(&exporter);

    assert!(!text.contains("snmp_about_info"));
    assert!(!text.contains("snmp_response_latency_seconds"));
    assert!(text.contains("# TYPE snmp_response_duration_seconds histogram"));
    assert!(text.contains("snmp_response_duration_seconds_count 0\n"));
    assert_eq!(bucket_counts(&text), vec![0; LATENCY_BUCKETS.len() + 1]);
}

#[tokio::test]
async fn test_single_probe_exposition() {
    let exporter = exporter(vec![reply(1260, "ops@example.com", 78)]);
    exporter.poller.run_cycle().await.unwrap();
    let text = scrape(&exporter);

    assert!(text.contains(
        "# HELP snmp_about_info SNMP narrative metric with a default value of 1\n\
         # TYPE snmp_about_info gauge\n\
         snmp_about_info{contact=\"ops@example.com\",sysServices=\"1001110\"} 1\n"
    ));
    assert!(text.contains(
        "# HELP snmp_response_latency_seconds SNMP packet response latency\n\
         # TYPE snmp_response_latency_seconds gauge\n\
         snmp_response_latency_seconds 0.00126 1609697880001\n"
    ));
    assert!(text.contains("# HELP snmp_response_duration_seconds SNMP packet response latency\n"));
    assert!(text.contains("snmp_response_duration_seconds_bucket{le=\"0.0005\"} 0\n"));
    assert!(text.contains("snmp_response_duration_seconds_bucket{le=\"0.001\"} 0\n"));
    assert!(text.contains("snmp_response_duration_seconds_bucket{le=\"0.0025\"} 1\n"));
    assert!(text.contains("snmp_response_duration_seconds_bucket{le=\"1\"} 1\n"));
    assert!(text.contains("snmp_response_duration_seconds_bucket{le=\"+Inf\"} 1\n"));
    assert!(text.contains("snmp_response_duration_seconds_sum 0.00126\n"));
    assert!(text.contains("snmp_response_duration_seconds_count 1\n"));
}

#[tokio::test]
async fn test_histogram_accumulates_successes_only() {
    let latencies_us = [300u64, 1260, 4000, 40_000, 700_000, 2_500_000];
    let mut replies: Vec<_> = latencies_us
        .iter()
        .map(|us| reply(*us, "noc", 72))
        .collect();
    replies.insert(
        2,
        Err(TransportError::Timeout {
            attempts: 4,
            timeout: Duration::from_secs(2),
        }),
    );

    let exporter = exporter(replies);
    for _ in 0..=latencies_us.len() {
        exporter.poller.run_cycle().await.unwrap();
    }
    let text = scrape(&exporter);

    let expected_sum: f64 = latencies_us.iter().map(|us| *us as f64 / 1e6).sum();
    let sum: f64 = text
        .lines()
        .find_map(|l| l.strip_prefix("snmp_response_duration_seconds_sum "))
        .unwrap()
        .parse()
        .unwrap();
    assert!((sum - expected_sum).abs() < 1e-9);
    assert!(text.contains("snmp_response_duration_seconds_count 6\n"));

    let counts = bucket_counts(&text);
    let mut expected: Vec<u64> = LATENCY_BUCKETS
        .iter()
        .map(|b| latencies_us.iter().filter(|us| **us as f64 / 1e6 <= *b).count() as u64)
        .collect();
    expected.push(latencies_us.len() as u64);
    assert_eq!(counts, expected);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_exposition() {
    let exporter = exporter(vec![
        reply(1260, "ops@example.com", 78),
        Err(TransportError::Agent {
            status: 5,
            name: "genErr",
            index: 0,
        }),
    ]);

    exporter.poller.run_cycle().await.unwrap();
    let before = scrape(&exporter);

    assert_eq!(exporter.poller.run_cycle().await.unwrap(), CycleOutcome::Skipped);
    assert_eq!(scrape(&exporter), before);
}

#[tokio::test]
async fn test_labels_replaced_between_cycles() {
    let mut second = reply(2000, "", 72);
    if let Ok(response) = &mut second {
        // Agent no longer returns a usable contact
        response.variables[0].value = Value::NoSuchObject;
    }
    let exporter = exporter(vec![reply(1260, "ops@example.com", 78), second]);

    exporter.poller.run_cycle().await.unwrap();
    exporter.poller.run_cycle().await.unwrap();
    let text = scrape(&exporter);

    assert!(text.contains("snmp_about_info{sysServices=\"1001000\"} 1\n"));
    assert!(!text.contains("ops@example.com"));
    assert!(!text.contains("1001110"));
}
