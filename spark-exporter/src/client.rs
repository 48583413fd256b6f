//! HTTP client for the Spark application REST API.
//!
//! One GET per endpoint, bounded by the timeout fixed at construction. There
//! is no retry logic here: a failed request is one failed scrape, reported
//! upstream through the `spark_up` gauge.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;

/// Upstream fetch failures. All recoverable; none abort the process.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Spark API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Spark API unreachable: {0}")]
    Unreachable(String),

    #[error("Spark API returned status {0}")]
    BadStatus(StatusCode),
}

/// Client for one Spark application's REST status API.
pub struct SparkClient {
    client: reqwest::Client,
    base_uri: String,
    timeout: Duration,
}

impl SparkClient {
    /// Create a client for the given base URI. The timeout bounds every
    /// request made through this client and cannot change afterwards.
    pub fn new(base_uri: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_uri: base_uri.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Fetch the applications list endpoint.
    pub async fn fetch_applications(&self) -> Result<Vec<u8>, FetchError> {
        self.get(&self.url("api/v1/applications")).await
    }

    /// Fetch the executors endpoint for one application.
    pub async fn fetch_executors(&self, app_id: &str) -> Result<Vec<u8>, FetchError> {
        self.get(&self.url(&format!("api/v1/applications/{}/executors", app_id)))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_uri, path)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status));
        }

        // Drain the body fully; the connection is returned to the pool on
        // every path, including errors, via drop.
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(body.to_vec())
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Unreachable(err.to_string())
        }
    }
}
