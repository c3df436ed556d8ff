#![forbid(unsafe_code)]

use clap::Parser;
use ootel_lib::{init_logging, load_from_path, Client, ServerStatus};
use opentelemetry::{global, KeyValue};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, info_span, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bring up OpenTelemetry from a TOML file and emit a heartbeat")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "ootel/config/basic.toml")]
    config: PathBuf,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long, value_name = "SECS")]
    run_for: Option<u64>,

    /// Seconds between heartbeats
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    interval: u64,

    /// How long shutdown may spend flushing spans and metrics
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    let logging = match init_logging(&cfg.logging, None) {
        Ok(logging) => logging,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let client = Client::from_config(&cfg);
    let telemetry = match client.init().await {
        Ok(telemetry) => telemetry,
        Err(err) => {
            error!(%err, "failed to initialize telemetry");
            std::process::exit(1);
        }
    };

    if let Some(provider) = telemetry.tracer_provider() {
        if let Err(err) = logging.attach_tracer(provider) {
            warn!(%err, "tracing spans will not be exported");
        }
    }

    info!(
        tracing = telemetry.tracer_provider().is_some(),
        metrics = telemetry.meter_provider().is_some(),
        "telemetry initialized"
    );

    if let Some(server) = telemetry.server() {
        match server.ready().await {
            Ok(addr) => {
                info!(%addr, "health/metrics server ready");
                watch_server(server.subscribe());
            }
            Err(err) => warn!(%err, "health/metrics server unavailable, continuing without it"),
        }
    }

    run_heartbeat(&cli).await;

    match telemetry.shutdown(Some(Duration::from_secs(cli.shutdown_timeout))) {
        Ok(()) => info!("telemetry shut down"),
        Err(err) => {
            error!(%err, "telemetry shutdown reported failures");
            std::process::exit(1);
        }
    }
}

/// Report a server that dies after it started listening
fn watch_server(mut status: watch::Receiver<ServerStatus>) {
    tokio::spawn(async move {
        if let Ok(status) = status.wait_for(|s| matches!(s, ServerStatus::Failed(_))).await {
            if let ServerStatus::Failed(reason) = &*status {
                warn!(%reason, "health/metrics server failed during run");
            }
        }
    });
}

async fn run_heartbeat(cli: &Cli) {
    let meter = global::meter("ootel");
    let heartbeats = meter
        .u64_counter("ootel_heartbeats_total")
        .with_description("Heartbeats emitted by the demo loop")
        .build();

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.interval.max(1)));
    let deadline = async {
        match cli.run_for {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut beat: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
            _ = &mut deadline => {
                info!("run time elapsed, shutting down");
                break;
            }
            _ = ticker.tick() => {
                beat += 1;
                let _span = info_span!("heartbeat", beat).entered();
                heartbeats.add(1, &[KeyValue::new("source", "demo")]);
                info!("heartbeat");
            }
        }
    }
}
