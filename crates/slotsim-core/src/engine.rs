//! The slot-by-slot simulation loop.
//!
//! [`SimulationEngine`] owns every piece of run state: the slot timeline, the
//! contender pool, the aggregate counters, the convergence monitor, and the
//! random number generator. Nothing is shared between engines, so
//! independent runs can execute side by side.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use slotsim_metrics::metrics::{self, Counter, Gauge, Histogram};
use slotsim_metrics::{metric_defs, RunLabels};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::convergence::{ConvergenceMonitor, ConvergenceSample, ConvergenceState};
use crate::error::{SimError, SimResult};
use crate::node::ContenderPool;
use crate::resolver::{ContentionResolver, SlotOutcome};
use crate::slot::SlotTimeline;
use crate::stats::{SimulationStats, SlotCounters};

/// Generator used when an engine is built from a seed.
pub type SimRng = ChaCha8Rng;

/// What happened after simulating one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More slots remain and the run has not converged.
    Continue,
    /// The convergence test passed at this slot.
    Converged,
    /// The last slot of the horizon was simulated without converging.
    HorizonExhausted,
}

/// Drives a single simulation run.
pub struct SimulationEngine<R = SimRng> {
    config: SimulationConfig,
    resolver: ContentionResolver,
    timeline: SlotTimeline,
    pool: ContenderPool,
    counters: SlotCounters,
    monitor: ConvergenceMonitor,
    rng: R,
    next_slot: usize,
    finished: Option<StepOutcome>,
    metrics: EngineMetrics,
}

impl SimulationEngine<SimRng> {
    /// Builds an engine whose generator is seeded from `seed`.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> SimResult<Self> {
        Self::new(config, SimRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SimulationEngine<R> {
    /// Validates `config` and allocates the timeline and pool.
    ///
    /// Metric handles are registered here, so a recorder must be installed
    /// before construction for the run to be observed.
    pub fn new(config: SimulationConfig, rng: R) -> SimResult<Self> {
        config.validate()?;
        let params = config.params;
        debug!(
            packet_size = params.packet_size,
            node_count = params.node_count,
            initial_cw = params.initial_contention_window,
            horizon = config.horizon,
            "building simulation engine"
        );

        Ok(SimulationEngine {
            resolver: ContentionResolver::new(params.packet_size),
            timeline: SlotTimeline::new(config.horizon),
            pool: ContenderPool::new(params.node_count, params.initial_contention_window),
            counters: SlotCounters::default(),
            monitor: ConvergenceMonitor::new(config.convergence),
            rng,
            next_slot: 0,
            finished: None,
            metrics: EngineMetrics::new(&config),
            config,
        })
    }

    /// Run configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current contender state.
    pub fn pool(&self) -> &ContenderPool {
        &self.pool
    }

    /// Slot history so far, including bursts scheduled into the future.
    pub fn timeline(&self) -> &SlotTimeline {
        &self.timeline
    }

    /// Counters accumulated so far.
    pub fn counters(&self) -> &SlotCounters {
        &self.counters
    }

    /// Number of slots simulated so far.
    pub fn slots_simulated(&self) -> usize {
        self.next_slot
    }

    /// Convergence state so far.
    pub fn convergence_state(&self) -> ConvergenceState {
        self.monitor.state()
    }

    /// Simulates the next slot.
    ///
    /// After the run has finished, further calls return the final outcome
    /// without simulating anything.
    pub fn step(&mut self) -> SimResult<StepOutcome> {
        if let Some(outcome) = self.finished {
            return Ok(outcome);
        }

        let slot = self.next_slot;
        let outcome =
            self.resolver
                .resolve(slot, &mut self.pool, &mut self.timeline, &mut self.rng)?;
        match &outcome {
            SlotOutcome::Quiet => {}
            SlotOutcome::Success(_) => self.counters.completed_packets += 1,
            SlotOutcome::Collision(nodes) => self.metrics.record_collision(nodes.len()),
        }

        self.counters.record(self.timeline.get(slot)?);
        self.next_slot += 1;

        if let Some(sample) = self.monitor.observe(slot, self.counters.transmission) {
            self.metrics.record_sample(&sample);
        }

        let step = if self.monitor.state() == ConvergenceState::Converged {
            StepOutcome::Converged
        } else if self.next_slot >= self.timeline.horizon() {
            StepOutcome::HorizonExhausted
        } else {
            StepOutcome::Continue
        };
        if step != StepOutcome::Continue {
            self.finished = Some(step);
        }
        Ok(step)
    }

    /// Runs until convergence or the end of the horizon.
    ///
    /// Running out of horizon is reported as [`SimError::NonConvergence`],
    /// carrying the statistics gathered up to that point.
    pub fn run(&mut self) -> SimResult<SimulationStats> {
        loop {
            match self.step()? {
                StepOutcome::Continue => {}
                StepOutcome::Converged => {
                    let stats = self.stats();
                    info!(
                        final_slot = stats.final_slot,
                        throughput = stats.throughput(),
                        efficiency = stats.transmission_fraction(),
                        "simulation converged"
                    );
                    self.metrics.record_run(&stats, &self.pool);
                    return Ok(stats);
                }
                StepOutcome::HorizonExhausted => {
                    let stats = self.stats();
                    warn!(
                        horizon = self.timeline.horizon(),
                        efficiency = stats.transmission_fraction(),
                        "simulation failed to converge"
                    );
                    self.metrics.record_run(&stats, &self.pool);
                    return Err(SimError::NonConvergence {
                        stats: Box::new(stats),
                    });
                }
            }
        }
    }

    /// Snapshot of the statistics as of the last simulated slot.
    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            params: self.config.params,
            final_slot: self.next_slot.saturating_sub(1),
            counters: self.counters,
            converged: self.monitor.state() == ConvergenceState::Converged,
        }
    }
}

/// Metric handles for one run, registered once with the run's labels.
struct EngineMetrics {
    labels: Vec<(&'static str, String)>,
    collision_events: Counter,
    colliding_nodes: Histogram,
    efficiency: Gauge,
    efficiency_delta: Gauge,
}

impl EngineMetrics {
    fn new(config: &SimulationConfig) -> Self {
        let params = config.params;
        let labels = RunLabels::new(
            params.packet_size,
            params.node_count,
            params.initial_contention_window,
        )
        .to_labels();

        EngineMetrics {
            collision_events: metrics::counter!(metric_defs::COLLISION_EVENTS.name, &labels),
            colliding_nodes: metrics::histogram!(metric_defs::COLLIDING_NODES.name, &labels),
            efficiency: metrics::gauge!(metric_defs::EFFICIENCY.name, &labels),
            efficiency_delta: metrics::gauge!(metric_defs::EFFICIENCY_DELTA.name, &labels),
            labels,
        }
    }

    fn record_collision(&self, nodes: usize) {
        self.collision_events.increment(1);
        self.colliding_nodes.record(nodes as f64);
    }

    fn record_sample(&self, sample: &ConvergenceSample) {
        self.efficiency.set(sample.efficiency);
        self.efficiency_delta.set(sample.delta);
    }

    fn record_run(&self, stats: &SimulationStats, pool: &ContenderPool) {
        let labels = &self.labels;
        let counters = &stats.counters;
        metrics::counter!(metric_defs::SLOTS_IDLE.name, labels).increment(counters.idle);
        metrics::counter!(metric_defs::SLOTS_TRANSMISSION.name, labels)
            .increment(counters.transmission);
        metrics::counter!(metric_defs::SLOTS_COLLISION.name, labels).increment(counters.collision);
        metrics::counter!(metric_defs::PACKETS_COMPLETED.name, labels)
            .increment(counters.completed_packets);
        metrics::gauge!(metric_defs::THROUGHPUT.name, labels).set(stats.throughput());

        if stats.converged {
            metrics::counter!(metric_defs::RUNS_CONVERGED.name, labels).increment(1);
            metrics::histogram!(metric_defs::CONVERGENCE_SLOT.name, labels)
                .record(stats.final_slot as f64);
        } else {
            metrics::counter!(metric_defs::RUNS_NON_CONVERGED.name, labels).increment(1);
        }

        let windows = metrics::histogram!(metric_defs::CONTENTION_WINDOW.name, labels);
        for (_, node) in pool.iter() {
            windows.record(node.contention_window() as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationParams;
    use crate::slot::SlotState;

    fn engine(packet_size: usize, nodes: usize, cw: u64, seed: u64) -> SimulationEngine {
        let config = SimulationConfig::new(SimulationParams::new(packet_size, nodes, cw));
        SimulationEngine::with_seed(config, seed).unwrap()
    }

    #[test]
    fn test_invalid_parameters_rejected_before_running() {
        let config = SimulationConfig::new(SimulationParams::new(0, 10, 8));
        assert!(matches!(
            SimulationEngine::with_seed(config, 1),
            Err(SimError::InvalidParameter { name: "packet_size", .. })
        ));
    }

    #[test]
    fn test_counters_conserved_every_step() {
        let mut engine = engine(4, 25, 8, 11);
        loop {
            let outcome = engine.step().unwrap();
            let counters = engine.counters();
            assert_eq!(counters.total_slots(), engine.slots_simulated() as u64);
            if outcome != StepOutcome::Continue {
                break;
            }
        }
        let stats = engine.stats();
        assert_eq!(stats.counters.total_slots(), stats.final_slot as u64 + 1);
    }

    #[test]
    fn test_burst_occupies_following_slots() {
        // One node, window 1: transmit, stay busy for the burst, re-sync for
        // one idle slot, transmit again.
        let mut engine = engine(3, 1, 1, 5);
        for _ in 0..8 {
            engine.step().unwrap();
        }
        let states: Vec<SlotState> = engine.timeline().iter().take(8).collect();
        use SlotState::{Idle as I, Transmission as T};
        assert_eq!(states, vec![T, T, T, I, T, T, T, I]);
        assert_eq!(engine.counters().completed_packets, 2);
        assert_eq!(engine.counters().idle, 2);
    }

    #[test]
    fn test_step_after_finish_is_stable() {
        let config = SimulationConfig::new(SimulationParams::new(1, 0, 1)).with_horizon(3);
        let mut engine = SimulationEngine::with_seed(config, 0).unwrap();
        assert_eq!(engine.step().unwrap(), StepOutcome::Continue);
        assert_eq!(engine.step().unwrap(), StepOutcome::Continue);
        assert_eq!(engine.step().unwrap(), StepOutcome::HorizonExhausted);
        assert_eq!(engine.step().unwrap(), StepOutcome::HorizonExhausted);
        assert_eq!(engine.slots_simulated(), 3);
    }

    #[test]
    fn test_backoff_stays_below_window() {
        let mut engine = engine(2, 40, 16, 21);
        while engine.step().unwrap() == StepOutcome::Continue {
            for (id, node) in engine.pool().iter() {
                if let Some(b) = node.backoff() {
                    assert!(b >= 1, "{id} kept an expired backoff");
                    assert!(b < node.contention_window(), "{id} backoff {b} out of window");
                }
            }
        }
    }
}
