//! `slotsim` binary.
//!
//! Usage: slotsim [OPTIONS] <PKT_SIZE> <NODE_COUNT> <CW_SIZE>

use std::io;
use std::process::ExitCode;

use clap::Parser;
use slotsim_runner::{execute, init_tracing, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = cli
        .resolve()
        .and_then(|request| execute(&request, &mut io::stdout().lock()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_non_convergence() {
                println!("Simulation failed to converge. Exiting...");
            } else if e.is_input_error() {
                eprintln!("Error taking inputs! {}", e);
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
