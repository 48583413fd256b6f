//! Prometheus metrics exporter for the Apache Spark application REST API.
//!
//! This crate scrapes a single Spark application's status API and republishes
//! executor and application figures as Prometheus metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  Spark REST API │────>│    Exporter     │────>│   HTTP Server   │
//! │  (/api/v1/...)  │     │ (scrape+apply)  │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Pull model: every request to the metrics endpoint triggers one scrape of
//! the Spark API, bounded by the configured timeout. Scrape failures are
//! reported through the `spark_up` gauge, never as HTTP errors.
//!
//! # Usage
//!
//! ```bash
//! spark-exporter --spark.application-uri http://localhost:4040
//! ```
//!
//! # Configuration
//!
//! All configuration comes from command-line flags; see
//! [`config::ExporterConfig`].

pub mod client;
pub mod config;
pub mod exporter;
pub mod http;
pub mod metrics;
pub mod model;
pub mod registry;

pub use config::ExporterConfig;
pub use exporter::{Exporter, SharedExporter};
pub use http::HttpServer;
pub use registry::{MetricRegistry, Snapshot};
