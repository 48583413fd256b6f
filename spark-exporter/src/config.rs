//! Configuration for the Spark exporter.
//!
//! All configuration comes from command-line flags at process start and is
//! immutable afterwards; there is no config file and no environment lookup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}'")]
    ListenAddr(String),

    #[error("Metrics path must start with '/': '{0}'")]
    MetricsPath(String),

    #[error("Invalid Spark application URI '{uri}': {reason}")]
    SparkUri { uri: String, reason: String },

    #[error("Spark timeout must be greater than zero")]
    Timeout,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Complete exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Address to listen on for the web interface and telemetry.
    pub listen: String,

    /// Path under which to expose metrics.
    pub metrics_path: String,

    /// Base URI of the Spark application REST API.
    pub spark_uri: String,

    /// Timeout for requests against the Spark API.
    pub spark_timeout: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:9110".to_string(),
            metrics_path: "/metrics".to_string(),
            spark_uri: "http://localhost:4040".to_string(),
            spark_timeout: Duration::from_secs(5),
            log_format: LogFormat::Text,
        }
    }
}

impl ExporterConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;

        if !self.metrics_path.starts_with('/') {
            return Err(ConfigError::MetricsPath(self.metrics_path.clone()));
        }

        match reqwest::Url::parse(&self.spark_uri) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::SparkUri {
                    uri: self.spark_uri.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::SparkUri {
                    uri: self.spark_uri.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if self.spark_timeout.is_zero() {
            return Err(ConfigError::Timeout);
        }

        Ok(())
    }

    /// Parse the configured listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::ListenAddr(self.listen.clone()))
    }
}
