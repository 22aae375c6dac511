//! Errors surfaced by the runner.

use slotsim_core::SimError;
use slotsim_metrics::prometheus::BuildError;
use thiserror::Error;

/// Errors that can occur while preparing, running, or reporting a simulation.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Metrics recorder error: {0}")]
    Metrics(#[from] BuildError),

    #[error("{failed} of {total} sweep points did not converge")]
    SweepNotConverged {
        /// Points that exhausted the horizon.
        failed: usize,
        /// Points in the sweep.
        total: usize,
    },
}

impl RunnerError {
    /// Process exit code for this error.
    ///
    /// Every runtime failure exits with 1; argument syntax errors never get
    /// here because clap exits with its own usage code.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// True if the simulation ran but did not converge.
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, RunnerError::Sim(SimError::NonConvergence { .. }))
    }

    /// True if the inputs were rejected before any simulation ran.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RunnerError::Sim(SimError::InvalidParameter { .. })
                | RunnerError::MissingParameter(_)
                | RunnerError::Yaml(_)
        )
    }
}
