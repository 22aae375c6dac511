//! Contention-window sweeps.
//!
//! A sweep runs one independent simulation per window in parallel. Point `i`
//! is seeded with `base_seed + i`, so the results depend only on the inputs
//! and never on how rayon schedules the runs.

use rayon::prelude::*;
use slotsim_core::{SimError, SimulationConfig, SimulationEngine, SimulationStats};
use tracing::{debug, warn};

/// Result of one sweep point.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    /// Configuration the point ran with.
    pub config: SimulationConfig,
    /// Seed the point ran with.
    pub seed: u64,
    /// Final statistics; `stats.converged` is false if the horizon ran out.
    pub stats: SimulationStats,
}

/// Builds one configuration per window, validating all of them up front.
pub fn sweep_configs(
    base: &SimulationConfig,
    windows: &[u64],
) -> Result<Vec<SimulationConfig>, SimError> {
    windows
        .iter()
        .map(|&cw| {
            let mut config = *base;
            config.params.initial_contention_window = cw;
            config.validate()?;
            Ok(config)
        })
        .collect()
}

/// Runs every window in parallel and returns the points in window order.
///
/// Non-convergence of a point is not an error; it is reported through
/// `stats.converged`.
pub fn run_sweep(
    base: &SimulationConfig,
    windows: &[u64],
    base_seed: u64,
) -> Result<Vec<SweepPoint>, SimError> {
    let configs = sweep_configs(base, windows)?;

    configs
        .into_par_iter()
        .enumerate()
        .map(|(i, config)| -> Result<SweepPoint, SimError> {
            let seed = base_seed.wrapping_add(i as u64);
            let stats = run_point(config, seed)?;
            debug!(
                cw = config.params.initial_contention_window,
                seed,
                converged = stats.converged,
                "sweep point finished"
            );
            Ok(SweepPoint {
                config,
                seed,
                stats,
            })
        })
        .collect()
}

fn run_point(config: SimulationConfig, seed: u64) -> Result<SimulationStats, SimError> {
    let mut engine = SimulationEngine::with_seed(config, seed)?;
    match engine.run() {
        Ok(stats) => Ok(stats),
        Err(SimError::NonConvergence { stats }) => {
            warn!(
                cw = config.params.initial_contention_window,
                "sweep point did not converge"
            );
            Ok(*stats)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotsim_core::SimulationParams;

    fn base() -> SimulationConfig {
        SimulationConfig::new(SimulationParams::new(2, 10, 1))
    }

    #[test]
    fn test_invalid_window_rejected_before_running() {
        let err = run_sweep(&base(), &[8, 0, 16], 1).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidParameter {
                name: "initial_contention_window",
                ..
            }
        ));
    }

    #[test]
    fn test_points_keep_window_order_and_seeds() {
        let points = run_sweep(&base(), &[64, 4, 16], 100).unwrap();
        let windows: Vec<u64> = points
            .iter()
            .map(|p| p.stats.params.initial_contention_window)
            .collect();
        let seeds: Vec<u64> = points.iter().map(|p| p.seed).collect();

        assert_eq!(windows, vec![64, 4, 16]);
        assert_eq!(seeds, vec![100, 101, 102]);
    }

    #[test]
    fn test_sweep_matches_sequential_runs() {
        let windows = [2, 8, 32, 128];
        let points = run_sweep(&base(), &windows, 7).unwrap();

        for (i, point) in points.iter().enumerate() {
            let expected = run_point(point.config, 7 + i as u64).unwrap();
            assert_eq!(point.stats, expected, "cw {}", windows[i]);
        }
    }

    #[test]
    fn test_empty_sweep() {
        assert!(run_sweep(&base(), &[], 0).unwrap().is_empty());
    }
}
