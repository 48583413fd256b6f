//! Prometheus exporter for Apache Spark application metrics.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use spark_exporter::config::LogFormat;
use spark_exporter::{Exporter, ExporterConfig, HttpServer};

/// Prometheus exporter for Apache Spark application metrics.
#[derive(Parser, Debug)]
#[command(name = "spark-exporter")]
#[command(about = "Export Apache Spark application metrics for Prometheus")]
#[command(version)]
struct Args {
    /// Address to listen on for web interface and telemetry.
    #[arg(long = "web.listen-address", default_value = "0.0.0.0:9110")]
    listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// URI on which to scrape Spark application metrics.
    #[arg(long = "spark.application-uri", default_value = "http://localhost:4040")]
    spark_application_uri: String,

    /// Timeout in seconds for requests against the Spark application API.
    #[arg(long = "spark.timeout-secs", default_value_t = 5)]
    spark_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ExporterConfig {
        listen: args.listen_address,
        metrics_path: args.telemetry_path,
        spark_uri: args.spark_application_uri,
        spark_timeout: Duration::from_secs(args.spark_timeout_secs),
        log_format: args.log_format,
    };

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("spark_exporter={}", log_level).parse()?);

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting Spark exporter");

    // Configuration errors are fatal before the listener ever starts.
    let exporter = Arc::new(Exporter::new(&config)?);
    let listen_addr = config.listen_addr()?;

    info!(
        uri = %config.spark_uri,
        timeout_secs = config.spark_timeout.as_secs(),
        "Scraping Spark application API"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(exporter, listen_addr, config.metrics_path.clone());
    let mut http_task = tokio::spawn(http_server.run(shutdown_rx));

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate()
                ).expect("failed to install SIGTERM handler");
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
        // An unbindable listen address lands here: surface it and exit non-zero.
        result = &mut http_task => {
            result??;
            anyhow::bail!("HTTP server exited unexpectedly");
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for the server to drain
    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    info!("Exporter stopped");
    Ok(())
}
