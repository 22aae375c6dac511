//! Metrics infrastructure for the slotted contention simulator.
//!
//! This crate declares every metric the simulator emits as a structured
//! [`Metric`] constant and provides [`RunLabels`], the label set attached to
//! all run-scoped metrics. It re-exports the `metrics` crate so emitters do
//! not need a direct dependency on it.
//!
//! # Example
//!
//! ```rust,ignore
//! use slotsim_metrics::{metric_defs, describe_metrics, RunLabels};
//!
//! // Initialize metrics descriptions at startup
//! describe_metrics();
//!
//! let labels = RunLabels::new(10, 20, 32);
//! metrics::counter!(metric_defs::SLOTS_IDLE.name, &labels.to_labels()).increment(1);
//! ```
//!
//! # Metric Type
//!
//! ```rust
//! use slotsim_metrics::{Metric, MetricKind};
//! use metrics::Unit;
//!
//! const MY_COUNTER: Metric = Metric::counter("my.counter")
//!     .with_description("A counter metric")
//!     .with_unit(Unit::Count)
//!     .with_labels(&["packet_size"]);
//!
//! assert_eq!(MY_COUNTER.kind, MetricKind::Counter);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// Declared with the const constructors so the whole catalogue lives in
/// [`metric_defs`] at compile time.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "slotsim.slots.idle").
    pub name: &'static str,
    /// The kind of metric (counter, gauge, histogram).
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    ///
    /// Without a recorder this is a no-op.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the simulator.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on every run-scoped metric.
    pub const RUN_LABELS: &[&str] = &["packet_size", "node_count", "initial_cw"];

    // ========================================================================
    // Slot Metrics
    // ========================================================================

    /// Slots in which the channel stayed idle.
    pub const SLOTS_IDLE: Metric = Metric::counter("slotsim.slots.idle")
        .with_description("Slots in which the channel stayed idle")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Slots occupied by a successful transmission.
    pub const SLOTS_TRANSMISSION: Metric = Metric::counter("slotsim.slots.transmission")
        .with_description("Slots occupied by a successful transmission")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Slots occupied by a collision.
    pub const SLOTS_COLLISION: Metric = Metric::counter("slotsim.slots.collision")
        .with_description("Slots occupied by a collision")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    // ========================================================================
    // Contention Metrics
    // ========================================================================

    /// Packets delivered without collision.
    pub const PACKETS_COMPLETED: Metric = Metric::counter("slotsim.packets.completed")
        .with_description("Packets delivered without collision")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Collision bursts started (one per colliding slot, not per node).
    pub const COLLISION_EVENTS: Metric = Metric::counter("slotsim.contention.collisions")
        .with_description("Collision bursts started")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Number of nodes whose backoff expired in the same colliding slot.
    pub const COLLIDING_NODES: Metric = Metric::histogram("slotsim.contention.colliding_nodes")
        .with_description("Nodes involved in each collision")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Contention window of each node when the run ends.
    pub const CONTENTION_WINDOW: Metric = Metric::histogram("slotsim.node.contention_window")
        .with_description("Per-node contention window at the end of the run")
        .with_labels(RUN_LABELS);

    // ========================================================================
    // Convergence Metrics
    // ========================================================================

    /// Efficiency (transmission slots / elapsed slots) at the latest sample.
    pub const EFFICIENCY: Metric = Metric::gauge("slotsim.convergence.efficiency")
        .with_description("Transmission slot fraction at the latest convergence sample")
        .with_labels(RUN_LABELS);

    /// Absolute efficiency change between the last two samples.
    pub const EFFICIENCY_DELTA: Metric = Metric::gauge("slotsim.convergence.delta")
        .with_description("Efficiency change between consecutive samples")
        .with_labels(RUN_LABELS);

    // ========================================================================
    // Run Metrics
    // ========================================================================

    /// Completed packets per simulated slot.
    pub const THROUGHPUT: Metric = Metric::gauge("slotsim.run.throughput")
        .with_description("Completed packets per simulated slot")
        .with_labels(RUN_LABELS);

    /// Slot index at which a run converged.
    pub const CONVERGENCE_SLOT: Metric = Metric::histogram("slotsim.run.convergence_slot")
        .with_description("Slot index at which the run converged")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Runs that reached steady state.
    pub const RUNS_CONVERGED: Metric = Metric::counter("slotsim.run.converged")
        .with_description("Runs that reached steady state")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Runs that exhausted the horizon without converging.
    pub const RUNS_NON_CONVERGED: Metric = Metric::counter("slotsim.run.non_converged")
        .with_description("Runs that exhausted the horizon without converging")
        .with_unit(Unit::Count)
        .with_labels(RUN_LABELS);

    /// Every metric, for bulk registration.
    pub const ALL: &[&Metric] = &[
        &SLOTS_IDLE,
        &SLOTS_TRANSMISSION,
        &SLOTS_COLLISION,
        &PACKETS_COMPLETED,
        &COLLISION_EVENTS,
        &COLLIDING_NODES,
        &CONTENTION_WINDOW,
        &EFFICIENCY,
        &EFFICIENCY_DELTA,
        &THROUGHPUT,
        &CONVERGENCE_SLOT,
        &RUNS_CONVERGED,
        &RUNS_NON_CONVERGED,
    ];
}

/// Labels identifying the parameters of one simulation run.
///
/// # Example
///
/// ```rust
/// use slotsim_metrics::RunLabels;
///
/// let labels = RunLabels::new(10, 20, 32);
/// let label_vec = labels.to_labels();
/// assert_eq!(label_vec.len(), 3);
/// assert!(label_vec.contains(&("node_count", "20".to_string())));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLabels {
    /// Slots occupied by each transmission.
    pub packet_size: usize,
    /// Number of contending nodes.
    pub node_count: usize,
    /// Contention window every node starts with.
    pub initial_cw: u64,
}

impl RunLabels {
    /// Creates labels for a run with the given parameters.
    pub fn new(packet_size: usize, node_count: usize, initial_cw: u64) -> Self {
        Self {
            packet_size,
            node_count,
            initial_cw,
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("packet_size", self.packet_size.to_string()),
            ("node_count", self.node_count.to_string()),
            ("initial_cw", self.initial_cw.to_string()),
        ]
    }
}

/// Describes all metrics used in the simulator.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Prometheus text exposition, for runs that want their metrics on disk.
#[cfg(feature = "prometheus")]
pub mod prometheus {
    use std::sync::OnceLock;

    pub use metrics_exporter_prometheus::{BuildError, PrometheusHandle};

    use metrics_exporter_prometheus::PrometheusBuilder;

    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    /// Installs the global Prometheus recorder and registers all descriptions.
    ///
    /// The recorder is installed once per process; later calls return a
    /// handle to the same recorder. Fails if some other global recorder was
    /// installed first.
    pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
        if let Some(handle) = HANDLE.get() {
            return Ok(handle.clone());
        }
        let handle = PrometheusBuilder::new().install_recorder()?;
        super::describe_metrics();
        Ok(HANDLE.get_or_init(|| handle).clone())
    }
}
