//! snmp-latency-exporter entry point.
//!
//! Resolves configuration, starts the aligned poller as a background task
//! and serves the Prometheus endpoint until SIGINT/SIGTERM.

mod cli;
mod commands;
mod config;
mod handlers;
mod state;

use anyhow::Context;
use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, ValueEnum};
use prometheus::Registry;
use snmp_latency_exporter::{
    AlignedScheduler, ExporterMetrics, LatencyProbe, Poller, ProbeStats, SampleStore, UdpClient,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, level_filters::LevelFilter, warn};

use cli::{Args, Commands, LogLevel};
use commands::{command_config, command_probe};
use config::{
    client_config, listen_addr, poll_interval, request_oids, resolve_config, show_config,
    static_labels, validate_effective_config, Config,
};
use handlers::{health_handler, metrics_handler, root_handler};
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config, args: &Args) {
    let level = args.log_level.clone().unwrap_or_else(|| {
        config
            .log_level
            .as_deref()
            .and_then(|s| LogLevel::from_str(s, true).ok())
            .unwrap_or(LogLevel::Info)
    });

    let filter = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Tracing subscriber already set");
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), format.clone(), *commented),

            Commands::Probe {
                iterations,
                verbose,
            } => {
                let config = load_validated_config(&args)?;
                setup_logging(&config, &args);
                command_probe(*iterations, *verbose, &config).await
            }
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    info!("Starting snmp-latency-exporter {}", env!("CARGO_PKG_VERSION"));

    let client_cfg = client_config(&config)?;
    let interval = poll_interval(&config)?;
    let scheduler = AlignedScheduler::new(interval)?;

    let registry = Registry::new();
    let store = Arc::new(SampleStore::new());
    let probe_stats = Arc::new(ProbeStats::new());
    let metrics = ExporterMetrics::new(&registry, store.clone())?;

    let client = UdpClient::connect(&client_cfg).await?;
    let poller = Poller::new(
        scheduler,
        LatencyProbe::new(client),
        store.clone(),
        metrics.histogram.clone(),
        probe_stats.clone(),
    )
    .with_oids(request_oids(&config)?)
    .with_static_labels(static_labels(&config)?)
    .with_policy(config.on_probe_error.unwrap_or_default());

    let mut poller_task = tokio::spawn(async move { poller.run().await });

    let addr = listen_addr(&config)?;

    let state: SharedState = Arc::new(AppState {
        registry,
        metrics,
        store,
        probe_stats,
        config: Arc::new(config.clone()),
        target: client_cfg.target.clone(),
        poll_interval: interval,
        start_time: Instant::now(),
    });

    // Configure HTTP server routes
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let server: std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<()>> + Send>> =
        if config.enable_tls.unwrap_or(false) {
            let (Some(cert_path), Some(key_path)) =
                (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
            else {
                return Err("TLS is enabled but certificate or key path is missing".into());
            };

            info!("Loading TLS certificate from: {}", cert_path);
            info!("Loading TLS private key from: {}", key_path);

            let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
                .await
                .with_context(|| format!("failed to load TLS configuration from {cert_path}"))?;

            info!("snmp-latency-exporter listening on https://{}", addr);
            Box::pin(axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()))
        } else {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;

            info!("snmp-latency-exporter listening on http://{}", addr);
            Box::pin(async move { axum::serve(listener, app).await })
        };

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        joined = &mut poller_task => {
            match joined {
                Ok(Ok(())) => warn!("Poller stopped unexpectedly"),
                Ok(Err(e)) => {
                    error!("Poller stopped: {}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    error!("Poller task failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    poller_task.abort();
    info!("snmp-latency-exporter stopped gracefully");
    Ok(())
}
