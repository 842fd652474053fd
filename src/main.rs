//! outbreak CLI - Deterministic compartmental outbreak simulation
//!
//! Command-line interface for running scenario studies.

use std::process::ExitCode;

use outbreak::cli::{init_logging, run_cli, Args};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    run_cli(args)
}
