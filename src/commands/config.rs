//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("snmp-latency-exporter.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# SNMP Latency Exporter Configuration
# ===================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 8436                   # HTTP port
#
# SNMP Target
# -----------
# target: "192.0.2.10"         # Agent host name or address (required)
# snmp_port: 161               # Agent UDP port
# community: "public"          # Community string
# snmp_version: "2c"           # "1" or "2c"
# timeout: "2s"                # Per-attempt response timeout
# retries: 3                   # Extra attempts after a timeout
#
# Polling
# -------
# poll_interval: "120s"        # Probes fire on multiples of this since the Unix epoch
# oids: null                   # OIDs to GET (null = sysContact.0 and sysServices.0)
# on_probe_error: "skip"       # "skip" keeps the last sample, "exit" stops the exporter
#
# Info Labels
# -----------
# info_labels:                 # Static labels added to snmp_about_info
#   site: "fra1"
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}
