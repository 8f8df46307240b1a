//! Configuration management for snmp-latency-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use serde::{Deserialize, Deserializer, Serialize};
use snmp_latency_exporter::labels::validate_label_name;
use snmp_latency_exporter::{
    ClientConfig, ConfigurationError, InfoLabels, ObjectId, ProbeErrorPolicy, Version,
};
use std::collections::BTreeMap;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8436;
pub const DEFAULT_SNMP_PORT: u16 = 161;
pub const DEFAULT_COMMUNITY: &str = "public";
pub const DEFAULT_TIMEOUT: &str = "2s";
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_POLL_INTERVAL: &str = "120s";

/// Configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // SNMP target
    pub target: Option<String>,
    #[serde(alias = "snmp-port")]
    pub snmp_port: Option<u16>,
    pub community: Option<String>,
    /// "1" | "2c"
    #[serde(
        default,
        alias = "snmp-version",
        deserialize_with = "deserialize_version"
    )]
    pub snmp_version: Option<String>,
    /// Per-attempt response timeout, humantime format ("2s", "500ms")
    pub timeout: Option<String>,
    pub retries: Option<u32>,

    // Polling
    #[serde(alias = "poll-interval")]
    pub poll_interval: Option<String>,
    /// OIDs requested every cycle (defaults to the label OIDs)
    pub oids: Option<Vec<String>>,
    #[serde(alias = "on-probe-error")]
    pub on_probe_error: Option<ProbeErrorPolicy>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    /// Static labels added to snmp_about_info
    #[serde(alias = "info-labels")]
    pub info_labels: Option<BTreeMap<String, String>>,
}

/// Accepts `snmp_version: 1` as well as `snmp_version: "1"`.
fn deserialize_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            target: None,
            snmp_port: Some(DEFAULT_SNMP_PORT),
            community: Some(DEFAULT_COMMUNITY.to_string()),
            snmp_version: Some(Version::default().to_string()),
            timeout: Some(DEFAULT_TIMEOUT.to_string()),
            retries: Some(DEFAULT_RETRIES),
            poll_interval: Some(DEFAULT_POLL_INTERVAL.to_string()),
            oids: None,
            on_probe_error: Some(ProbeErrorPolicy::Skip),
            enable_health: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            info_labels: None,
        }
    }
}

/// Parses a humantime duration, rejecting zero.
pub fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidDuration {
        field,
        value: value.to_string(),
        reason,
    };

    let duration = humantime::parse_duration(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(duration)
}

/// Effective poll interval.
pub fn poll_interval(cfg: &Config) -> Result<Duration, ConfigurationError> {
    parse_duration(
        "poll_interval",
        cfg.poll_interval.as_deref().unwrap_or(DEFAULT_POLL_INTERVAL),
    )
}

/// Effective SNMP client settings. Fails when no target is configured.
pub fn client_config(cfg: &Config) -> Result<ClientConfig, ConfigurationError> {
    let target = cfg
        .target
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConfigurationError::Invalid("no SNMP target configured".to_string()))?;

    let community = cfg.community.as_deref().unwrap_or(DEFAULT_COMMUNITY);
    if community.is_empty() {
        return Err(ConfigurationError::Invalid(
            "community must not be empty".to_string(),
        ));
    }

    let version = match cfg.snmp_version.as_deref() {
        Some(v) => v.parse::<Version>().map_err(ConfigurationError::Invalid)?,
        None => Version::default(),
    };

    Ok(ClientConfig {
        target: target.to_string(),
        port: cfg.snmp_port.unwrap_or(DEFAULT_SNMP_PORT),
        community: community.to_string(),
        version,
        timeout: parse_duration("timeout", cfg.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))?,
        retries: cfg.retries.unwrap_or(DEFAULT_RETRIES),
    })
}

/// Configured OIDs; empty when the label OIDs should be used.
pub fn request_oids(cfg: &Config) -> Result<Vec<ObjectId>, ConfigurationError> {
    let oids = cfg
        .oids
        .iter()
        .flatten()
        .map(|s| {
            s.parse::<ObjectId>()
                .map_err(|e| ConfigurationError::Invalid(format!("oids: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if oids.len() > snmp_latency_exporter::snmp::MAX_OIDS {
        return Err(ConfigurationError::Invalid(format!(
            "oids: {} entries configured, at most {} are allowed",
            oids.len(),
            snmp_latency_exporter::snmp::MAX_OIDS
        )));
    }
    Ok(oids)
}

/// Static info labels with validated names.
pub fn static_labels(cfg: &Config) -> Result<InfoLabels, ConfigurationError> {
    let labels = cfg.info_labels.clone().unwrap_or_default();
    for name in labels.keys() {
        validate_label_name(name)?;
    }
    Ok(labels)
}

/// HTTP listen address. IPv6 binds such as `::` need no brackets.
pub fn listen_addr(cfg: &Config) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let bind = cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let ip = bind
        .trim()
        .parse::<IpAddr>()
        .map_err(|e| format!("Invalid bind address '{}': {}", bind, e))?;
    Ok(SocketAddr::new(ip, cfg.port.unwrap_or(DEFAULT_PORT)))
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    client_config(cfg)?;
    poll_interval(cfg)?;
    request_oids(cfg)?;
    static_labels(cfg)?;
    listen_addr(cfg)?;

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file("certificate", cert)?;
                check_pem_file("private key", key)?;
            }
        }
    }

    Ok(())
}

fn check_pem_file(kind: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", kind, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("TLS {} file not found: {}", kind, path).into())
        }
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", kind, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(target) = &args.target {
        config.target = Some(target.clone());
    }
    if let Some(community) = &args.community {
        config.community = Some(community.clone());
    }
    if let Some(interval) = &args.poll_interval {
        config.poll_interval = Some(interval.clone());
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => {
            let defaults = [
                "/etc/snmp-latency-exporter/config.yaml",
                "./snmp-latency-exporter.yaml",
                "./snmp-latency-exporter.yml",
                "./snmp-latency-exporter.json",
                "./snmp-latency-exporter.toml",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn with_target() -> Config {
        Config {
            target: Some("192.0.2.10".to_string()),
            ..Config::default()
        }
    }

    fn temp_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let cfg = with_target();
        let client = client_config(&cfg).unwrap();
        assert_eq!(client.port, 161);
        assert_eq!(client.community, "public");
        assert_eq!(client.version, Version::V2c);
        assert_eq!(client.timeout, Duration::from_secs(2));
        assert_eq!(client.retries, 3);
        assert_eq!(poll_interval(&cfg).unwrap(), Duration::from_secs(120));
        assert!(request_oids(&cfg).unwrap().is_empty());
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_missing_target_rejected() {
        assert!(validate_effective_config(&Config::default()).is_err());
    }

    #[test]
    fn test_zero_and_garbage_durations_rejected() {
        assert!(matches!(
            parse_duration("poll_interval", "0s"),
            Err(ConfigurationError::InvalidDuration { field: "poll_interval", .. })
        ));
        assert!(parse_duration("timeout", "soon").is_err());
        assert_eq!(parse_duration("timeout", "500ms").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_listen_addr_accepts_ipv6_bind() {
        let mut cfg = with_target();
        cfg.bind = Some("::".to_string());
        assert_eq!(listen_addr(&cfg).unwrap().to_string(), "[::]:8436");

        cfg.bind = Some("127.0.0.1".to_string());
        cfg.port = Some(9000);
        assert_eq!(listen_addr(&cfg).unwrap().to_string(), "127.0.0.1:9000");

        cfg.bind = Some("localhost".to_string());
        assert!(listen_addr(&cfg).is_err());
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_unencodable_oid_rejected() {
        let mut cfg = with_target();
        cfg.oids = Some(vec!["2.4294967295".to_string()]);
        assert!(request_oids(&cfg).is_err());
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_invalid_static_label_rejected() {
        let mut cfg = with_target();
        cfg.info_labels = Some([("data-center".to_string(), "fra".to_string())].into());
        assert_eq!(
            static_labels(&cfg),
            Err(ConfigurationError::InvalidLabelName("data-center".to_string()))
        );
    }

    #[test]
    fn test_load_yaml() {
        let file = temp_config(
            ".yaml",
            "target: switch.example.net\n\
             snmp_version: 1\n\
             poll_interval: 5m\n\
             on_probe_error: exit\n\
             oids:\n  - .1.3.6.1.2.1.1.4.0\n\
             info_labels:\n  site: fra1\n",
        );
        let cfg = load_config(Some(file.path())).unwrap();

        let client = client_config(&cfg).unwrap();
        assert_eq!(client.target, "switch.example.net");
        assert_eq!(client.version, Version::V1);
        assert_eq!(poll_interval(&cfg).unwrap(), Duration::from_secs(300));
        assert_eq!(cfg.on_probe_error, Some(ProbeErrorPolicy::Exit));
        assert_eq!(request_oids(&cfg).unwrap().len(), 1);
        assert_eq!(
            static_labels(&cfg).unwrap().get("site").map(String::as_str),
            Some("fra1")
        );
    }

    #[test]
    fn test_load_json_and_toml() {
        let json = temp_config(".json", r#"{"target": "10.0.0.1", "retries": 0}"#);
        let cfg = load_config(Some(json.path())).unwrap();
        assert_eq!(cfg.retries, Some(0));

        let toml = temp_config(".toml", "target = \"10.0.0.2\"\nsnmp_port = 1161\n");
        let cfg = load_config(Some(toml.path())).unwrap();
        assert_eq!(client_config(&cfg).unwrap().port, 1161);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/snmp-latency-exporter.yaml"))).is_err());
    }

    #[test]
    fn test_tls_requires_both_paths() {
        let mut cfg = with_target();
        cfg.enable_tls = Some(true);
        cfg.tls_cert_path = Some("/tmp/cert.pem".to_string());
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("tls_key_path"));
    }

    #[test]
    fn test_rendered_config_loads_back() {
        let cfg = with_target();
        for (format, suffix) in [
            (ConfigFormat::Yaml, ".yaml"),
            (ConfigFormat::Json, ".json"),
            (ConfigFormat::Toml, ".toml"),
        ] {
            let text = render_config(&cfg, &format).unwrap();
            let file = temp_config(suffix, &text);
            let loaded = load_config(Some(file.path())).unwrap();
            assert_eq!(loaded.target.as_deref(), Some("192.0.2.10"));
            assert_eq!(loaded.poll_interval.as_deref(), Some(DEFAULT_POLL_INTERVAL));
        }
    }
}
