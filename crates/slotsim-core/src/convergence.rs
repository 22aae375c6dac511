//! Steady-state detection on measured efficiency.
//!
//! Every `sampling_interval` slots the monitor computes the fraction of
//! slots spent in successful transmission and compares it with the previous
//! sample. Two consecutive changes below `threshold` end the run.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult};

/// Default number of slots between convergence samples.
pub const DEFAULT_SAMPLING_INTERVAL: usize = 1000;

/// Default bound on the efficiency change between samples.
pub const DEFAULT_THRESHOLD: f64 = 0.0005;

/// Efficiency assumed before the first sample.
const INITIAL_EFFICIENCY: f64 = 0.000001;

/// Delta assumed before the first sample; large enough to never count as stable.
const INITIAL_DELTA: f64 = 1.0;

/// Sampling parameters for the convergence test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Slots between samples (K).
    pub sampling_interval: usize,
    /// Efficiency change below which a sample counts as stable (ε).
    pub threshold: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        ConvergenceConfig {
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ConvergenceConfig {
    /// Checks that the interval is positive and the threshold a positive finite number.
    pub fn validate(&self) -> SimResult<()> {
        if self.sampling_interval == 0 {
            return Err(SimError::invalid(
                "sampling_interval",
                self.sampling_interval,
                "must be at least 1",
            ));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(SimError::invalid(
                "threshold",
                self.threshold,
                "must be a positive finite number",
            ));
        }
        Ok(())
    }
}

/// Whether the run has reached steady state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceState {
    /// Still sampling.
    Running,
    /// Two consecutive samples were stable.
    Converged,
}

/// One efficiency measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceSample {
    /// Slot index the sample was taken at.
    pub slot: usize,
    /// Transmission slots divided by `slot`.
    pub efficiency: f64,
    /// Absolute change from the previous sample.
    pub delta: f64,
}

/// Tracks efficiency samples and decides when to stop.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    config: ConvergenceConfig,
    previous_efficiency: f64,
    /// Transmission count and slot of the last stored sample.
    previous_ratio: Option<(u64, usize)>,
    previous_delta: f64,
    state: ConvergenceState,
}

impl ConvergenceMonitor {
    /// Creates a monitor in the `Running` state.
    pub fn new(config: ConvergenceConfig) -> Self {
        ConvergenceMonitor {
            config,
            previous_efficiency: INITIAL_EFFICIENCY,
            previous_ratio: None,
            previous_delta: INITIAL_DELTA,
            state: ConvergenceState::Running,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConvergenceState {
        self.state
    }

    /// Sampling parameters.
    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// True if `slot` is a positive multiple of the sampling interval.
    pub fn is_sample_point(&self, slot: usize) -> bool {
        slot != 0 && slot % self.config.sampling_interval == 0
    }

    /// Feeds the transmission count as of `slot`.
    ///
    /// Returns the sample if one was taken at this slot. Once converged the
    /// monitor ignores further input.
    pub fn observe(&mut self, slot: usize, transmission_count: u64) -> Option<ConvergenceSample> {
        if self.state == ConvergenceState::Converged || !self.is_sample_point(slot) {
            return None;
        }

        let efficiency = transmission_count as f64 / slot as f64;
        let delta = match self.previous_ratio {
            Some((previous_count, previous_slot)) => {
                ratio_distance(transmission_count, slot, previous_count, previous_slot)
            }
            None => (efficiency - self.previous_efficiency).abs(),
        };
        let sample = ConvergenceSample {
            slot,
            efficiency,
            delta,
        };

        if delta < self.config.threshold && self.previous_delta < self.config.threshold {
            self.state = ConvergenceState::Converged;
        } else {
            self.previous_efficiency = efficiency;
            self.previous_ratio = Some((transmission_count, slot));
            self.previous_delta = delta;
        }

        debug!(slot, efficiency, delta, state = ?self.state, "convergence sample");
        Some(sample)
    }
}

/// `|a/b - c/d|` with an exact numerator and a single rounding division.
fn ratio_distance(a: u64, b: usize, c: u64, d: usize) -> f64 {
    let lhs = u128::from(a) * d as u128;
    let rhs = u128::from(c) * b as u128;
    let numerator = lhs.abs_diff(rhs);
    let denominator = b as u128 * d as u128;
    numerator as f64 / denominator as f64
}
