//! Text and JSON rendering of run results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotsim_core::{SimulationConfig, SimulationStats};

use crate::sweep::SweepPoint;

/// Renders the classic line-oriented report.
///
/// The last line, `" <cw> <fraction>"`, is kept plot-friendly so reports from
/// several windows can be concatenated into a data file.
pub fn render_text(stats: &SimulationStats) -> String {
    let c = &stats.counters;
    format!(
        "Idle Slots: {}\n\
         Transmission Slots: {}\n\
         Collision Slots: {}\n\
         Packets successfully transmitted: {}\n\
         Total slots used for simulation: {}\n\
         Throughput: {:.6}\n\
         {}\n",
        c.idle,
        c.transmission,
        c.collision,
        c.completed_packets,
        stats.final_slot,
        stats.throughput(),
        sweep_line(stats),
    )
}

/// One `" <cw> <transmission_fraction>"` data line.
pub fn sweep_line(stats: &SimulationStats) -> String {
    format!(
        " {} {:.6}",
        stats.params.initial_contention_window,
        stats.transmission_fraction()
    )
}

/// Renders sweep results, one data line per window.
///
/// Windows that did not converge are emitted as `#` comment lines.
pub fn render_sweep_text(points: &[SweepPoint]) -> String {
    points
        .iter()
        .map(|point| {
            let line = if point.stats.converged {
                sweep_line(&point.stats)
            } else {
                format!(
                    "# {} did not converge (efficiency {:.6} at slot {})",
                    point.stats.params.initial_contention_window,
                    point.stats.transmission_fraction(),
                    point.stats.final_slot
                )
            };
            line + "\n"
        })
        .collect()
}

/// Serializable report of a single run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub timestamp: DateTime<Utc>,
    pub seed: u64,
    pub config: &'a SimulationConfig,
    pub stats: &'a SimulationStats,
    pub throughput: f64,
    pub transmission_fraction: f64,
    pub collision_fraction: f64,
    pub idle_fraction: f64,
}

impl<'a> RunReport<'a> {
    pub fn new(config: &'a SimulationConfig, seed: u64, stats: &'a SimulationStats) -> Self {
        RunReport {
            timestamp: Utc::now(),
            seed,
            config,
            stats,
            throughput: stats.throughput(),
            transmission_fraction: stats.transmission_fraction(),
            collision_fraction: stats.collision_fraction(),
            idle_fraction: stats.idle_fraction(),
        }
    }
}

/// Renders a single run as pretty JSON.
pub fn render_json(
    config: &SimulationConfig,
    seed: u64,
    stats: &SimulationStats,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RunReport::new(config, seed, stats))
}

#[derive(Serialize)]
struct SweepReport<'a> {
    timestamp: DateTime<Utc>,
    points: Vec<RunReport<'a>>,
}

/// Renders sweep results as pretty JSON.
pub fn render_sweep_json(points: &[SweepPoint]) -> Result<String, serde_json::Error> {
    let report = SweepReport {
        timestamp: Utc::now(),
        points: points
            .iter()
            .map(|p| RunReport::new(&p.config, p.seed, &p.stats))
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}
