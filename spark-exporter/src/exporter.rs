//! Scrape coordination: fetch from the Spark API, decode, apply to the registry.
//!
//! Pull model: there is no background timer. Every external metrics request
//! triggers one scrape cycle through [`Exporter::collect`]. Fetch and decode
//! run without holding any registry lock; only the final apply step writes.
//!
//! Error policy is freeze-on-error: when a fetch or decode fails, only the
//! `spark_up` gauge is replaced (with 0) and every other instrument keeps its
//! last-known series, so dashboards show the final state of a target that
//! went away instead of a cliff to nothing.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::{FetchError, SparkClient};
use crate::config::{ConfigError, ExporterConfig};
use crate::metrics;
use crate::model::{self, ApplicationInfo, DecodeError};
use crate::registry::{MetricRegistry, ScrapeUpdate, Snapshot};

/// Why a scrape cycle failed. Fetch and decode failures behave identically
/// (`spark_up` 0, everything else frozen); the distinction only feeds the log.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Collects Spark application stats from the configured URI and republishes
/// them as metric instruments.
pub struct Exporter {
    client: SparkClient,
    registry: MetricRegistry,
    scrape_lock: Mutex<()>,
}

/// Create a shareable exporter handle.
pub type SharedExporter = Arc<Exporter>;

impl Exporter {
    /// Create an exporter. Validates the configuration; any error here is
    /// fatal at startup.
    pub fn new(config: &ExporterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = SparkClient::new(&config.spark_uri, config.spark_timeout)?;
        let registry = MetricRegistry::new(metrics::instruments());

        // spark_up reads 0 until the first scrape completes.
        let mut init = ScrapeUpdate::default();
        init.set(metrics::UP, Vec::new(), 0.0);
        registry.apply(init);

        Ok(Self {
            client,
            registry,
            scrape_lock: Mutex::new(()),
        })
    }

    /// Run one scrape cycle and return a consistent snapshot.
    ///
    /// Concurrent callers serialize on the scrape lock: a second caller waits
    /// for the in-flight scrape to finish, then runs its own fresh one.
    /// Applied updates are always whole scrapes, so no snapshot can mix label
    /// sets from different cycles.
    pub async fn collect(&self) -> Snapshot {
        let _scrape = self.scrape_lock.lock().await;

        match self.scrape().await {
            Ok(update) => self.registry.apply(update),
            Err(err) => {
                warn!("Scrape failed: {}", err);
                let mut update = ScrapeUpdate::default();
                update.set(metrics::UP, Vec::new(), 0.0);
                self.registry.apply(update);
            }
        }

        self.registry.snapshot()
    }

    /// Fetch and decode everything the instruments need. No registry lock is
    /// held while the network round-trips run.
    async fn scrape(&self) -> Result<ScrapeUpdate, ScrapeError> {
        let body = self.client.fetch_applications().await?;
        let mut applications = model::decode_applications(&body)?;

        for app in &mut applications {
            let body = self.client.fetch_executors(&app.id).await?;
            app.executors = model::decode_executors(&body)?;
        }

        debug!("Scraped {} application(s)", applications.len());
        Ok(stage(self.registry.begin_scrape(), &applications))
    }
}

/// Map decoded records onto staged instrument values.
fn stage(mut update: ScrapeUpdate, applications: &[ApplicationInfo]) -> ScrapeUpdate {
    update.set(metrics::UP, Vec::new(), 1.0);

    for app in applications {
        let app_labels = vec![app.id.clone()];

        update.set(
            metrics::APPLICATION_ATTEMPTS,
            app_labels.clone(),
            app.attempts.len() as f64,
        );

        // Attempts are listed newest first by the Spark API.
        let completed = app.attempts.first().is_some_and(|a| a.completed);
        update.set(
            metrics::APPLICATION_COMPLETED,
            app_labels.clone(),
            if completed { 1.0 } else { 0.0 },
        );

        update.set(metrics::APPLICATION_EXECUTORS, app_labels.clone(), 0.0);

        for executor in &app.executors {
            update.inc(metrics::APPLICATION_EXECUTORS, app_labels.clone(), 1.0);

            let labels = vec![executor.id.clone()];
            update.set(
                metrics::EXECUTOR_ACTIVE_TASKS,
                labels.clone(),
                executor.active_tasks as f64,
            );
            update.set(
                metrics::EXECUTOR_COMPLETED_TASKS,
                labels.clone(),
                executor.completed_tasks as f64,
            );
            update.set(
                metrics::EXECUTOR_FAILED_TASKS,
                labels.clone(),
                executor.failed_tasks as f64,
            );
            update.set(
                metrics::EXECUTOR_TOTAL_TASKS,
                labels.clone(),
                executor.total_tasks as f64,
            );
            update.set(
                metrics::EXECUTOR_MEMORY_USED,
                labels.clone(),
                executor.memory_used as f64,
            );
            update.set(
                metrics::EXECUTOR_DISK_USED,
                labels.clone(),
                executor.disk_used as f64,
            );
            update.set(
                metrics::EXECUTOR_MAX_MEMORY,
                labels.clone(),
                executor.max_memory as f64,
            );
            update.set(
                metrics::EXECUTOR_RDD_BLOCKS,
                labels.clone(),
                executor.rdd_blocks as f64,
            );
            update.set(
                metrics::EXECUTOR_TOTAL_DURATION,
                labels.clone(),
                executor.total_duration as f64,
            );
            update.set(
                metrics::EXECUTOR_TOTAL_INPUT_BYTES,
                labels.clone(),
                executor.total_input_bytes as f64,
            );
            update.set(
                metrics::EXECUTOR_TOTAL_SHUFFLE_READ,
                labels.clone(),
                executor.total_shuffle_read as f64,
            );
            update.set(
                metrics::EXECUTOR_TOTAL_SHUFFLE_WRITE,
                labels,
                executor.total_shuffle_write as f64,
            );
        }
    }

    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttemptInfo, ExecutorInfo, ExecutorLogs};

    fn make_executor(id: &str, active: i64, completed: i64) -> ExecutorInfo {
        ExecutorInfo {
            id: id.to_string(),
            active_tasks: active,
            completed_tasks: completed,
            failed_tasks: 1,
            total_tasks: active + completed + 1,
            disk_used: 10,
            memory_used: 2048,
            max_memory: 4096,
            rdd_blocks: 2,
            total_duration: 5100,
            total_input_bytes: 65536,
            total_shuffle_read: 1024,
            total_shuffle_write: 512,
            host_port: "10.0.0.1:42585".to_string(),
            executor_logs: ExecutorLogs::default(),
        }
    }

    fn make_application(id: &str, executors: Vec<ExecutorInfo>) -> ApplicationInfo {
        ApplicationInfo {
            id: id.to_string(),
            name: "test app".to_string(),
            attempts: vec![AttemptInfo {
                completed: false,
                start_time: "2026-03-15T10:15:30.000GMT".to_string(),
                end_time: String::new(),
                spark_user: "spark".to_string(),
            }],
            executors,
        }
    }

    fn registry() -> MetricRegistry {
        MetricRegistry::new(metrics::instruments())
    }

    #[test]
    fn test_stage_executor_series() {
        let registry = registry();
        let apps = vec![make_application(
            "app-1",
            vec![make_executor("1", 3, 10), make_executor("2", 0, 5)],
        )];

        registry.apply(stage(registry.begin_scrape(), &apps));
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.value(metrics::UP, &[]), Some(1.0));
        assert_eq!(snapshot.value(metrics::EXECUTOR_ACTIVE_TASKS, &["1"]), Some(3.0));
        assert_eq!(snapshot.value(metrics::EXECUTOR_ACTIVE_TASKS, &["2"]), Some(0.0));
        assert_eq!(snapshot.value(metrics::EXECUTOR_COMPLETED_TASKS, &["1"]), Some(10.0));
        assert_eq!(snapshot.value(metrics::EXECUTOR_COMPLETED_TASKS, &["2"]), Some(5.0));
        assert_eq!(snapshot.series_count(metrics::EXECUTOR_ACTIVE_TASKS), 2);
        assert_eq!(snapshot.value(metrics::EXECUTOR_MAX_MEMORY, &["1"]), Some(4096.0));
    }

    #[test]
    fn test_stage_application_series() {
        let registry = registry();
        let apps = vec![make_application("app-1", vec![make_executor("1", 0, 0)])];

        registry.apply(stage(registry.begin_scrape(), &apps));
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.value(metrics::APPLICATION_ATTEMPTS, &["app-1"]), Some(1.0));
        assert_eq!(snapshot.value(metrics::APPLICATION_COMPLETED, &["app-1"]), Some(0.0));
        assert_eq!(snapshot.value(metrics::APPLICATION_EXECUTORS, &["app-1"]), Some(1.0));
    }

    #[test]
    fn test_stage_completed_reads_latest_attempt() {
        let registry = registry();
        let mut app = make_application("app-1", vec![]);
        app.attempts = vec![
            AttemptInfo {
                completed: true,
                ..Default::default()
            },
            AttemptInfo::default(),
        ];

        registry.apply(stage(registry.begin_scrape(), &[app]));
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.value(metrics::APPLICATION_COMPLETED, &["app-1"]), Some(1.0));
        assert_eq!(snapshot.value(metrics::APPLICATION_ATTEMPTS, &["app-1"]), Some(2.0));
        assert_eq!(snapshot.value(metrics::APPLICATION_EXECUTORS, &["app-1"]), Some(0.0));
    }

    #[test]
    fn test_stage_empty_response_clears_everything() {
        let registry = registry();

        let apps = vec![make_application("app-1", vec![make_executor("1", 3, 10)])];
        registry.apply(stage(registry.begin_scrape(), &apps));

        registry.apply(stage(registry.begin_scrape(), &[]));
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.value(metrics::UP, &[]), Some(1.0));
        assert_eq!(snapshot.series_count(metrics::EXECUTOR_ACTIVE_TASKS), 0);
        assert_eq!(snapshot.series_count(metrics::APPLICATION_ATTEMPTS), 0);
    }

    #[test]
    fn test_new_exporter_starts_down() {
        let exporter = Exporter::new(&ExporterConfig::default()).unwrap();

        let snapshot = exporter.registry.snapshot();
        assert_eq!(snapshot.value(metrics::UP, &[]), Some(0.0));
        assert_eq!(snapshot.series_count(metrics::EXECUTOR_ACTIVE_TASKS), 0);
    }

    #[test]
    fn test_new_exporter_rejects_bad_uri() {
        let config = ExporterConfig {
            spark_uri: "not a uri".to_string(),
            ..Default::default()
        };

        assert!(Exporter::new(&config).is_err());
    }
}
