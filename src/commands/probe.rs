//! Probe command implementation.
//!
//! Runs probes against the configured target and prints latency and labels,
//! without starting the HTTP server.

use snmp_latency_exporter::{LabelExtractor, LatencyProbe, UdpClient};

use crate::config::{client_config, request_oids, static_labels, Config};

/// Probes the configured target `iterations` times.
pub async fn command_probe(
    iterations: usize,
    verbose: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client_cfg = client_config(config)?;
    let extractor = LabelExtractor::default();
    let mut oids = request_oids(config)?;
    if oids.is_empty() {
        oids = extractor.oids();
    }
    let base_labels = static_labels(config)?;

    println!("🔎 SNMP Latency Exporter - Probe Mode");
    println!("=====================================");
    println!(
        "Target: {}:{} (SNMP v{}, timeout {:?}, retries {})",
        client_cfg.target, client_cfg.port, client_cfg.version, client_cfg.timeout, client_cfg.retries
    );

    let probe = LatencyProbe::new(UdpClient::connect(&client_cfg).await?);

    let mut latencies = Vec::with_capacity(iterations);
    let mut failures = 0usize;

    for iteration in 1..=iterations {
        println!("\n🔄 Probe {}/{}:", iteration, iterations);

        match probe.probe(&oids).await {
            Ok(result) => {
                println!("   ⏱  Latency: {:.6}s", result.latency_seconds());
                println!("   🕒 Observed at: {}", result.observed_at);

                if verbose {
                    for variable in &result.variables {
                        println!("   ├─ {} = {}", variable.oid, variable.value);
                    }
                }

                let mut labels = base_labels.clone();
                labels.extend(extractor.extract(&result.variables));
                for (name, value) in &labels {
                    println!("   🏷  {}=\"{}\"", name, value);
                }

                latencies.push(result.latency_seconds());
            }
            Err(e) => {
                failures += 1;
                println!("   ❌ Probe failed: {}", e);
            }
        }
    }

    println!("\n📊 Summary");
    println!("   Successful: {}", latencies.len());
    println!("   Failed: {}", failures);
    if !latencies.is_empty() {
        let min = latencies.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = latencies.iter().cloned().fold(0.0, f64::max);
        let avg = latencies.iter().sum::<f64>() / latencies.len() as f64;
        println!("   Latency min/avg/max: {:.6}s / {:.6}s / {:.6}s", min, avg, max);
    }

    if latencies.is_empty() && iterations > 0 {
        return Err("all probes failed".into());
    }
    Ok(())
}
