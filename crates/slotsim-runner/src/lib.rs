//! # slotsim-runner
//!
//! Command-line front end for `slotsim-core`: argument and run-file
//! handling, single runs and parallel contention-window sweeps, text and JSON
//! reports, and optional Prometheus metrics output.

pub mod cli;
pub mod error;
pub mod report;
pub mod run_file;
pub mod sweep;

use std::io::Write;

use slotsim_core::{SimError, SimulationEngine, SimulationStats};
use slotsim_metrics::prometheus;
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, OutputFormat, RunRequest};
pub use error::RunnerError;
pub use run_file::{load_run_file, RunFile};
pub use sweep::{run_sweep, SweepPoint};

/// Installs the global tracing subscriber, logging to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs a resolved request and writes its report to `out`, flushing it.
///
/// A single run that exhausts its horizon returns
/// [`SimError::NonConvergence`]; in JSON mode its partial report is written
/// first. A sweep reports every point and fails with
/// [`RunnerError::SweepNotConverged`] if any point did not converge.
pub fn execute<W: Write>(request: &RunRequest, out: &mut W) -> Result<(), RunnerError> {
    let metrics = match &request.metrics_out {
        Some(_) => Some(prometheus::install_recorder()?),
        None => None,
    };

    let result = if request.sweep_cw.is_empty() {
        execute_single(request, out)
    } else {
        execute_sweep(request, out)
    }
    .and_then(|()| out.flush().map_err(RunnerError::from));

    if let (Some(handle), Some(path)) = (metrics, &request.metrics_out) {
        std::fs::write(path, handle.render())?;
    }
    result
}

fn execute_single<W: Write>(request: &RunRequest, out: &mut W) -> Result<(), RunnerError> {
    let mut engine = SimulationEngine::with_seed(request.config, request.seed)?;
    match engine.run() {
        Ok(stats) => write_single(request, &stats, out),
        Err(SimError::NonConvergence { stats }) => {
            if request.format == OutputFormat::Json {
                write_single(request, &stats, out)?;
            }
            Err(SimError::NonConvergence { stats }.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_single<W: Write>(
    request: &RunRequest,
    stats: &SimulationStats,
    out: &mut W,
) -> Result<(), RunnerError> {
    match request.format {
        OutputFormat::Text => out.write_all(report::render_text(stats).as_bytes())?,
        OutputFormat::Json => {
            writeln!(out, "{}", report::render_json(&request.config, request.seed, stats)?)?
        }
    }
    Ok(())
}

fn execute_sweep<W: Write>(request: &RunRequest, out: &mut W) -> Result<(), RunnerError> {
    let points = run_sweep(&request.config, &request.sweep_cw, request.seed)?;
    match request.format {
        OutputFormat::Text => out.write_all(report::render_sweep_text(&points).as_bytes())?,
        OutputFormat::Json => writeln!(out, "{}", report::render_sweep_json(&points)?)?,
    }

    let failed = points.iter().filter(|p| !p.stats.converged).count();
    if failed > 0 {
        return Err(RunnerError::SweepNotConverged {
            failed,
            total: points.len(),
        });
    }
    Ok(())
}
