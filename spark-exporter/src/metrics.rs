//! The fixed set of instruments exported for a Spark application.
//!
//! All metric names carry the `spark` namespace prefix. Executor instruments
//! are labeled by `executor_id`, application instruments by `app_id`; the
//! schemas never change after construction. `spark_executor_completedTasks`
//! keeps its historical mixed-case name for dashboard compatibility.

use crate::registry::{MetricDesc, MetricKind};

/// Label schema for executor-scoped instruments.
pub const EXECUTOR_LABELS: &[&str] = &["executor_id"];

/// Label schema for application-scoped instruments.
pub const APPLICATION_LABELS: &[&str] = &["app_id"];

/// Health of the last scrape.
pub const UP: &str = "spark_up";

pub const EXECUTOR_ACTIVE_TASKS: &str = "spark_executor_active_tasks";
pub const EXECUTOR_COMPLETED_TASKS: &str = "spark_executor_completedTasks";
pub const EXECUTOR_FAILED_TASKS: &str = "spark_executor_failed_tasks";
pub const EXECUTOR_TOTAL_TASKS: &str = "spark_executor_total_tasks";
pub const EXECUTOR_MEMORY_USED: &str = "spark_executor_memory_used_bytes";
pub const EXECUTOR_DISK_USED: &str = "spark_executor_disk_used_bytes";
pub const EXECUTOR_MAX_MEMORY: &str = "spark_executor_max_memory_bytes";
pub const EXECUTOR_RDD_BLOCKS: &str = "spark_executor_rdd_blocks";
pub const EXECUTOR_TOTAL_DURATION: &str = "spark_executor_total_duration_ms";
pub const EXECUTOR_TOTAL_INPUT_BYTES: &str = "spark_executor_total_input_bytes";
pub const EXECUTOR_TOTAL_SHUFFLE_READ: &str = "spark_executor_total_shuffle_read_bytes";
pub const EXECUTOR_TOTAL_SHUFFLE_WRITE: &str = "spark_executor_total_shuffle_write_bytes";

pub const APPLICATION_ATTEMPTS: &str = "spark_application_attempts";
pub const APPLICATION_COMPLETED: &str = "spark_application_completed";
pub const APPLICATION_EXECUTORS: &str = "spark_application_executors";

fn executor_gauge(name: &str, help: &str) -> MetricDesc {
    MetricDesc {
        name: name.to_string(),
        help: help.to_string(),
        kind: MetricKind::Gauge,
        labels: EXECUTOR_LABELS,
    }
}

fn executor_counter(name: &str, help: &str) -> MetricDesc {
    MetricDesc {
        name: name.to_string(),
        help: help.to_string(),
        kind: MetricKind::Counter,
        labels: EXECUTOR_LABELS,
    }
}

fn application_gauge(name: &str, help: &str) -> MetricDesc {
    MetricDesc {
        name: name.to_string(),
        help: help.to_string(),
        kind: MetricKind::Gauge,
        labels: APPLICATION_LABELS,
    }
}

/// The complete instrument set, registered once at process start.
pub fn instruments() -> Vec<MetricDesc> {
    vec![
        MetricDesc {
            name: UP.to_string(),
            help: "Was the last scrape of the Spark application API successful.".to_string(),
            kind: MetricKind::Gauge,
            labels: &[],
        },
        executor_gauge(EXECUTOR_ACTIVE_TASKS, "Current number of active tasks."),
        executor_gauge(EXECUTOR_MEMORY_USED, "Storage memory used by the executor."),
        executor_gauge(EXECUTOR_DISK_USED, "Disk space used for RDD storage."),
        executor_gauge(EXECUTOR_MAX_MEMORY, "Maximum memory available for storage."),
        executor_gauge(EXECUTOR_RDD_BLOCKS, "Number of RDD blocks stored on the executor."),
        executor_counter(EXECUTOR_COMPLETED_TASKS, "Total number of completed tasks."),
        executor_counter(EXECUTOR_FAILED_TASKS, "Total number of failed tasks."),
        executor_counter(EXECUTOR_TOTAL_TASKS, "Total number of tasks."),
        executor_counter(EXECUTOR_TOTAL_DURATION, "Elapsed time spent running tasks."),
        executor_counter(EXECUTOR_TOTAL_INPUT_BYTES, "Total input bytes read."),
        executor_counter(EXECUTOR_TOTAL_SHUFFLE_READ, "Total shuffle bytes read."),
        executor_counter(EXECUTOR_TOTAL_SHUFFLE_WRITE, "Total shuffle bytes written."),
        application_gauge(APPLICATION_ATTEMPTS, "Number of attempts known for the application."),
        application_gauge(APPLICATION_COMPLETED, "Whether the latest attempt is completed."),
        application_gauge(APPLICATION_EXECUTORS, "Number of executors reported for the application."),
    ]
}
