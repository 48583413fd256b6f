//! Typed views of the Spark application REST API.
//!
//! The upstream schema is fixed and not owned by this crate. Unknown fields
//! are ignored so newer Spark versions keep decoding; the fields we do read
//! are strict. A record without an `id` is useless (its metric series would
//! have no label), and a numeric field of the wrong shape means the upstream
//! schema drifted, so either case fails the whole decode rather than emitting
//! partial records.

use serde::Deserialize;
use thiserror::Error;

/// Decode failures for Spark API responses.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed Spark API response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One application known to the Spark REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    /// Application identifier (e.g. "app-20260315101530-0001").
    pub id: String,

    /// Human-readable application name.
    #[serde(default)]
    pub name: String,

    /// Attempts, listed newest first by the Spark API.
    #[serde(default)]
    pub attempts: Vec<AttemptInfo>,

    /// Executors reported for this application. Not part of the applications
    /// response; filled in from the per-application executors endpoint.
    #[serde(skip)]
    pub executors: Vec<ExecutorInfo>,
}

/// One attempt of an application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptInfo {
    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub start_time: String,

    #[serde(default)]
    pub end_time: String,

    #[serde(default)]
    pub spark_user: String,
}

/// One executor of an application. Identity is `(application id, executor id)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorInfo {
    /// Executor identifier (e.g. "driver", "1").
    pub id: String,

    pub active_tasks: i64,
    pub completed_tasks: i64,
    pub failed_tasks: i64,
    pub total_tasks: i64,

    pub disk_used: i64,
    pub memory_used: i64,
    pub max_memory: i64,
    pub rdd_blocks: i64,

    pub total_duration: i64,
    pub total_input_bytes: i64,
    pub total_shuffle_read: i64,
    pub total_shuffle_write: i64,

    #[serde(default)]
    pub host_port: String,

    #[serde(default)]
    pub executor_logs: ExecutorLogs,
}

/// Log locations advertised by an executor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorLogs {
    #[serde(default)]
    pub stderr: String,

    #[serde(default)]
    pub stdout: String,
}

/// Decode the applications list endpoint response.
pub fn decode_applications(body: &[u8]) -> Result<Vec<ApplicationInfo>, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}

/// Decode the per-application executors endpoint response.
pub fn decode_executors(body: &[u8]) -> Result<Vec<ExecutorInfo>, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}
