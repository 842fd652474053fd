//! CLI module for outbreak.
//!
//! All CLI logic lives here rather than in `main.rs` so it can be tested.
//! `run_cli` is the entry point.

mod args;
mod commands;
mod output;

use tracing_subscriber::{fmt, EnvFilter};

pub use args::{Args, Command};
pub use commands::{compare, run_cli, run_reference, run_study, validate_study};
pub use output::{
    print_comparison, print_help, print_version, render_json, render_summary_table,
    version_string,
};

/// Initialize logging to stderr.
///
/// `RUST_LOG` overrides the default filter, which is `warn` for quiet runs
/// and `debug` for this crate when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,outbreak=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
