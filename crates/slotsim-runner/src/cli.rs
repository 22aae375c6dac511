//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use slotsim_core::{ConvergenceConfig, SimulationConfig, SimulationParams};
use tracing::info;

use crate::run_file::{load_run_file, RunFile};
use crate::RunnerError;

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Slotted CSMA/CA contention simulator with binary exponential backoff.
#[derive(Debug, Clone, Parser)]
#[command(name = "slotsim", version, about)]
pub struct Cli {
    /// Slots occupied by each packet (1-100)
    pub packet_size: Option<usize>,

    /// Number of contending nodes (0-1000)
    pub node_count: Option<usize>,

    /// Initial contention window (1-512)
    pub cw_size: Option<u64>,

    /// YAML run file; positional arguments and options override its values
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Random seed (defaults to the wall clock)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum number of slots to simulate
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Slots between convergence samples
    #[arg(long)]
    pub sampling_interval: Option<usize>,

    /// Efficiency change below which a sample counts as stable
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Comma-separated contention windows to sweep in parallel
    #[arg(long, value_delimiter = ',', value_name = "CW,...")]
    pub sweep_cw: Vec<u64>,

    /// Write Prometheus metrics to this file after the run
    #[arg(long, value_name = "PATH")]
    pub metrics_out: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// A fully resolved invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    /// Engine configuration (for a sweep, the window is replaced per point).
    pub config: SimulationConfig,
    /// Base seed.
    pub seed: u64,
    /// Windows to sweep; empty for a single run.
    pub sweep_cw: Vec<u64>,
    /// Report format.
    pub format: OutputFormat,
    /// Where to write Prometheus metrics, if anywhere.
    pub metrics_out: Option<PathBuf>,
}

impl Cli {
    /// Merges the run file (if any) with command-line values.
    pub fn resolve(&self) -> Result<RunRequest, RunnerError> {
        let file = match &self.config {
            Some(path) => load_run_file(path)?,
            None => RunFile::default(),
        };
        self.resolve_with(file)
    }

    /// Merges an already loaded run file with command-line values.
    pub fn resolve_with(&self, file: RunFile) -> Result<RunRequest, RunnerError> {
        let sweeping = !self.sweep_cw.is_empty() || !file.sweep_cw.is_empty();

        let packet_size = self
            .packet_size
            .or(file.packet_size)
            .ok_or(RunnerError::MissingParameter("packet_size"))?;
        let node_count = self
            .node_count
            .or(file.node_count)
            .ok_or(RunnerError::MissingParameter("node_count"))?;
        // A sweep supplies its own windows; the base window only matters for
        // single runs.
        let cw = match self.cw_size.or(file.initial_contention_window) {
            Some(cw) => cw,
            None if sweeping => 1,
            None => return Err(RunnerError::MissingParameter("cw_size")),
        };

        let defaults = SimulationConfig::new(SimulationParams::new(packet_size, node_count, cw));
        let config = defaults
            .with_horizon(self.horizon.or(file.horizon).unwrap_or(defaults.horizon))
            .with_convergence(ConvergenceConfig {
                sampling_interval: self
                    .sampling_interval
                    .or(file.sampling_interval)
                    .unwrap_or(defaults.convergence.sampling_interval),
                threshold: self
                    .threshold
                    .or(file.threshold)
                    .unwrap_or(defaults.convergence.threshold),
            });

        let seed = match self.seed.or(file.seed) {
            Some(seed) => seed,
            None => {
                let seed = seed_from_clock();
                info!(seed, "no seed given, using wall clock");
                seed
            }
        };

        let sweep_cw = if self.sweep_cw.is_empty() {
            file.sweep_cw
        } else {
            self.sweep_cw.clone()
        };

        Ok(RunRequest {
            config,
            seed,
            sweep_cw,
            format: self.format,
            metrics_out: self.metrics_out.clone(),
        })
    }
}

fn seed_from_clock() -> u64 {
    chrono::Utc::now().timestamp_micros().unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("slotsim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_positional_arguments() {
        let request = parse(&["10", "20", "32", "--seed", "1"]).resolve().unwrap();
        assert_eq!(request.config.params, SimulationParams::new(10, 20, 32));
        assert_eq!(request.config.horizon, slotsim_core::DEFAULT_HORIZON);
        assert_eq!(request.config.convergence, ConvergenceConfig::default());
        assert_eq!(request.seed, 1);
        assert_eq!(request.format, OutputFormat::Text);
        assert!(request.sweep_cw.is_empty());
    }

    #[test]
    fn test_options() {
        let cli = parse(&[
            "1",
            "2",
            "4",
            "--horizon",
            "5000",
            "--sampling-interval",
            "100",
            "--threshold",
            "0.01",
            "--format",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let request = cli.resolve().unwrap();
        assert_eq!(request.config.horizon, 5000);
        assert_eq!(request.config.convergence.sampling_interval, 100);
        assert_eq!(request.config.convergence.threshold, 0.01);
        assert_eq!(request.format, OutputFormat::Json);
    }

    #[test]
    fn test_missing_parameter() {
        let err = parse(&["10", "20"]).resolve().unwrap_err();
        assert!(matches!(err, RunnerError::MissingParameter("cw_size")));
    }

    #[test]
    fn test_non_numeric_argument_is_usage_error() {
        let err = Cli::try_parse_from(["slotsim", "ten", "20", "32"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_sweep_does_not_need_window() {
        let request = parse(&["5", "10", "--sweep-cw", "2,4,8", "--seed", "3"])
            .resolve()
            .unwrap();
        assert_eq!(request.sweep_cw, vec![2, 4, 8]);
    }

    #[test]
    fn test_command_line_overrides_run_file() {
        let file = RunFile {
            packet_size: Some(10),
            node_count: Some(20),
            initial_contention_window: Some(32),
            horizon: Some(1234),
            seed: Some(5),
            ..Default::default()
        };
        let request = parse(&["--seed", "6"]).resolve_with(file.clone()).unwrap();
        assert_eq!(request.config.params, SimulationParams::new(10, 20, 32));
        assert_eq!(request.config.horizon, 1234);
        assert_eq!(request.seed, 6);

        let request = parse(&["1", "2", "3"]).resolve_with(file).unwrap();
        assert_eq!(request.config.params, SimulationParams::new(1, 2, 3));
        assert_eq!(request.seed, 5);
    }
}
