//! Simulation parameters and their bounds.

use serde::{Deserialize, Serialize};

use crate::convergence::ConvergenceConfig;
use crate::error::{SimError, SimResult};

/// Largest accepted packet size, in slots.
pub const MAX_PACKET_SIZE: usize = 100;

/// Largest accepted number of contending nodes.
pub const MAX_NODE_COUNT: usize = 1000;

/// Largest accepted initial contention window.
pub const MAX_CONTENTION_WINDOW: u64 = 512;

/// Default number of slots simulated before giving up on convergence.
pub const DEFAULT_HORIZON: usize = 100_000;

/// The three inputs that define a contention scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Slots occupied by each transmission or collision.
    pub packet_size: usize,
    /// Number of nodes contending for the channel.
    pub node_count: usize,
    /// Contention window each node starts with.
    pub initial_contention_window: u64,
}

impl SimulationParams {
    /// Creates a parameter set without validating it.
    pub fn new(packet_size: usize, node_count: usize, initial_contention_window: u64) -> Self {
        SimulationParams {
            packet_size,
            node_count,
            initial_contention_window,
        }
    }

    /// Checks every parameter against its bounds.
    ///
    /// A pool of zero nodes is accepted; it models an idle channel.
    pub fn validate(&self) -> SimResult<()> {
        if !(1..=MAX_PACKET_SIZE).contains(&self.packet_size) {
            return Err(SimError::invalid(
                "packet_size",
                self.packet_size,
                format!("must be between 1 and {MAX_PACKET_SIZE}"),
            ));
        }
        if self.node_count > MAX_NODE_COUNT {
            return Err(SimError::invalid(
                "node_count",
                self.node_count,
                format!("must not exceed {MAX_NODE_COUNT}"),
            ));
        }
        if !(1..=MAX_CONTENTION_WINDOW).contains(&self.initial_contention_window) {
            return Err(SimError::invalid(
                "initial_contention_window",
                self.initial_contention_window,
                format!("must be between 1 and {MAX_CONTENTION_WINDOW}"),
            ));
        }
        Ok(())
    }
}

/// Everything needed to build a [`SimulationEngine`](crate::SimulationEngine).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Scenario inputs.
    #[serde(flatten)]
    pub params: SimulationParams,
    /// Maximum number of slots to simulate.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Convergence test settings.
    #[serde(flatten)]
    pub convergence: ConvergenceConfig,
}

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

impl SimulationConfig {
    /// Default horizon and convergence settings for `params`.
    pub fn new(params: SimulationParams) -> Self {
        SimulationConfig {
            params,
            horizon: DEFAULT_HORIZON,
            convergence: ConvergenceConfig::default(),
        }
    }

    /// Overrides the horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Overrides the convergence settings.
    pub fn with_convergence(mut self, convergence: ConvergenceConfig) -> Self {
        self.convergence = convergence;
        self
    }

    /// Validates parameters, horizon, and convergence settings.
    pub fn validate(&self) -> SimResult<()> {
        self.params.validate()?;
        if self.horizon == 0 {
            return Err(SimError::invalid("horizon", self.horizon, "must be at least 1"));
        }
        self.convergence.validate()
    }
}
