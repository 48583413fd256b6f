//! Metric instrument registry.
//!
//! The instrument set is fixed at construction; only the per-label value
//! mappings change between scrapes. A scrape stages its values in a
//! [`ScrapeUpdate`] and the registry swaps the staged series maps in under a
//! single write lock, so a concurrent reader sees either the whole previous
//! scrape or the whole new one. Each swap replaces an instrument's series
//! wholesale: executors that disappeared upstream lose their series instead
//! of lingering at stale values.

use std::collections::BTreeMap;
use std::io::Write;

use parking_lot::RwLock;
use tracing::warn;

/// Metric instrument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    /// The TYPE comment string for the Prometheus exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Static description of one metric instrument.
///
/// The label-key schema is fixed here; series within the instrument differ
/// only in label values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDesc {
    /// Full metric name, namespace prefix included.
    pub name: String,
    /// HELP text.
    pub help: String,
    /// Gauge or counter.
    pub kind: MetricKind,
    /// Label keys, in exposition order.
    pub labels: &'static [&'static str],
}

/// Label values for one series, ordered to match the instrument's label keys.
pub type LabelValues = Vec<String>;

type SeriesMap = BTreeMap<LabelValues, f64>;

/// Staged series values for one scrape cycle.
///
/// Built in isolation while no lock is held, then handed to
/// [`MetricRegistry::apply`] in one piece. Every instrument named here has
/// its live series map replaced by the staged one; instruments not named are
/// left untouched (that is what freeze-on-error relies on).
#[derive(Debug, Default)]
pub struct ScrapeUpdate {
    series: BTreeMap<String, SeriesMap>,
}

impl ScrapeUpdate {
    /// Stage an empty series map for `name`, clearing the instrument on apply.
    pub fn reset(&mut self, name: &str) {
        self.series.entry(name.to_string()).or_default();
    }

    /// Stage `value` for the series identified by `labels`.
    pub fn set(&mut self, name: &str, labels: LabelValues, value: f64) {
        self.series
            .entry(name.to_string())
            .or_default()
            .insert(labels, value);
    }

    /// Add `delta` to the staged value for the series identified by `labels`,
    /// starting from zero if the series has not been staged yet.
    pub fn inc(&mut self, name: &str, labels: LabelValues, delta: f64) {
        *self
            .series
            .entry(name.to_string())
            .or_default()
            .entry(labels)
            .or_insert(0.0) += delta;
    }
}

/// Thread-safe registry of metric instruments.
pub struct MetricRegistry {
    descs: BTreeMap<String, MetricDesc>,
    series: RwLock<BTreeMap<String, SeriesMap>>,
}

impl MetricRegistry {
    /// Create a registry holding the given instruments, all without series.
    pub fn new(descs: Vec<MetricDesc>) -> Self {
        let descs: BTreeMap<String, MetricDesc> =
            descs.into_iter().map(|d| (d.name.clone(), d)).collect();
        let series: BTreeMap<String, SeriesMap> = descs
            .keys()
            .map(|name| (name.clone(), SeriesMap::new()))
            .collect();

        Self {
            descs,
            series: RwLock::new(series),
        }
    }

    /// Start a full-replacement update: every registered instrument is staged
    /// with an empty series map, so instruments the scrape does not touch end
    /// up cleared rather than stale.
    pub fn begin_scrape(&self) -> ScrapeUpdate {
        let mut update = ScrapeUpdate::default();
        for name in self.descs.keys() {
            update.reset(name);
        }
        update
    }

    /// Swap the staged series maps into the registry.
    ///
    /// One write-lock critical section covers every instrument in the update,
    /// which is what keeps a concurrent [`snapshot`](Self::snapshot) from
    /// observing half of one scrape and half of another.
    pub fn apply(&self, update: ScrapeUpdate) {
        let mut live = self.series.write();

        for (name, staged) in update.series {
            let Some(desc) = self.descs.get(&name) else {
                warn!("Dropping values for unregistered instrument '{}'", name);
                continue;
            };

            let arity = desc.labels.len();
            if staged.keys().any(|labels| labels.len() != arity) {
                warn!(
                    "Dropping values for '{}': label arity does not match schema {:?}",
                    name, desc.labels
                );
                continue;
            }

            live.insert(name, staged);
        }
    }

    /// Take an immutable, consistent view of all instruments' current values.
    pub fn snapshot(&self) -> Snapshot {
        let live = self.series.read();

        let families = self
            .descs
            .values()
            .map(|desc| SnapshotFamily {
                desc: desc.clone(),
                series: live.get(&desc.name).cloned().unwrap_or_default(),
            })
            .collect();

        Snapshot { families }
    }
}

/// One instrument and its series inside a [`Snapshot`].
#[derive(Debug, Clone, PartialEq)]
struct SnapshotFamily {
    desc: MetricDesc,
    series: SeriesMap,
}

/// Immutable view of all instruments' values at a point in time.
///
/// Families are ordered by metric name and series by label values, so
/// [`render`](Self::render) output is deterministic and two snapshots of the
/// same state compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    families: Vec<SnapshotFamily>,
}

impl Snapshot {
    /// Look up the value of one series.
    pub fn value(&self, name: &str, labels: &[&str]) -> Option<f64> {
        let labels: LabelValues = labels.iter().map(|l| l.to_string()).collect();
        self.families
            .iter()
            .find(|f| f.desc.name == name)
            .and_then(|f| f.series.get(&labels))
            .copied()
    }

    /// Number of series currently held by one instrument.
    pub fn series_count(&self, name: &str) -> usize {
        self.families
            .iter()
            .find(|f| f.desc.name == name)
            .map(|f| f.series.len())
            .unwrap_or(0)
    }

    /// Render in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut output = Vec::with_capacity(self.families.len() * 100);

        for family in &self.families {
            if family.series.is_empty() {
                continue;
            }

            writeln!(output, "# HELP {} {}", family.desc.name, family.desc.help).ok();
            writeln!(output, "# TYPE {} {}", family.desc.name, family.desc.kind.as_str()).ok();

            for (labels, value) in &family.series {
                writeln!(
                    output,
                    "{}{} {}",
                    family.desc.name,
                    format_labels(family.desc.labels, labels),
                    format_value(*value)
                )
                .ok();
            }
        }

        String::from_utf8(output).unwrap_or_default()
    }
}

/// Format a label set for the exposition format, empty string for none.
fn format_labels(keys: &[&str], values: &[String]) -> String {
    if keys.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = keys
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
