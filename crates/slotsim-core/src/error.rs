//! Error types for the simulation core.

use thiserror::Error;

use crate::stats::SimulationStats;

/// Errors that can occur when building or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A simulation input is out of range or malformed.
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value, rendered as text.
        value: String,
        /// What the value must satisfy.
        reason: String,
    },

    /// The horizon was exhausted before the efficiency stabilized.
    ///
    /// The statistics accumulated up to the horizon are kept as a snapshot.
    #[error("Simulation failed to converge by slot {}", .stats.final_slot)]
    NonConvergence {
        /// Counters at the moment the horizon ran out.
        stats: Box<SimulationStats>,
    },

    /// A slot index past the timeline horizon was read.
    #[error("Slot index {index} is outside the timeline horizon {horizon}")]
    OutOfRange {
        /// Requested slot index.
        index: usize,
        /// Configured horizon.
        horizon: usize,
    },

    /// More nodes became ready in one slot than exist in the pool.
    #[error("Ready set of {ready} nodes exceeds pool capacity {capacity}")]
    CapacityExceeded {
        /// Size of the ready set.
        ready: usize,
        /// Number of nodes in the pool.
        capacity: usize,
    },
}

impl SimError {
    /// Builds an [`SimError::InvalidParameter`].
    pub(crate) fn invalid(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        SimError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the partial statistics carried by a non-convergence error.
    pub fn partial_stats(&self) -> Option<&SimulationStats> {
        match self {
            SimError::NonConvergence { stats } => Some(stats),
            _ => None,
        }
    }
}

/// Result alias for the simulation core.
pub type SimResult<T> = Result<T, SimError>;
