//! CLI output formatting.
//!
//! Rendering is split from printing so the text can be tested.

use std::fmt::Write as _;

use crate::error::EpiResult;
use crate::scenarios::{Comparison, ScenarioSummary};

/// Version line, including the git hash when the build captured one.
#[must_use]
pub fn version_string() -> String {
    let version = option_env!("OUTBREAK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("outbreak {version} ({hash})"),
        _ => format!("outbreak {version}"),
    }
}

/// Print version information.
pub fn print_version() {
    println!("{}", version_string());
}

/// Print help message.
pub fn print_help() {
    println!(
        r"outbreak - Deterministic compartmental outbreak simulation

USAGE:
    outbreak <COMMAND> [OPTIONS]

COMMANDS:
    run <study.yaml>            Run every scenario of a study
        --parallel              Run scenarios on all cores
        --json                  Print summaries and aligned series as JSON

    compare                     Run normal life vs. mild and strong distancing
        --json                  Print JSON instead of a table

    validate <study.yaml>       Check a study file without running it

    help                        Show this help message
    version                     Show version information

OPTIONS:
    -v, --verbose               Log scenario events (RUST_LOG overrides)

EXAMPLES:
    outbreak compare
    outbreak run studies/social_distancing.yaml --parallel
    outbreak validate studies/social_distancing.yaml
"
    );
}

fn format_day(day: Option<u32>) -> String {
    day.map_or_else(|| "never".to_string(), |d| d.to_string())
}

/// Render scenario summaries as a fixed-width table.
#[must_use]
pub fn render_summary_table(summaries: &[ScenarioSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<28} {:>6} {:>14} {:>10} {:>11} {:>9} {:>14}",
        "Scenario", "R0", "Total dead", "Gone day", "Rt<1 day", "% immune", "Peak infected"
    );
    let _ = writeln!(out, "{}", "-".repeat(98));
    for s in summaries {
        let _ = writeln!(
            out,
            "{:<28} {:>6.2} {:>14.0} {:>10} {:>11} {:>8.0}% {:>14.0}",
            s.label,
            s.initial_reproduction_number,
            s.total_dead,
            format_day(s.herd_immunity_day),
            format_day(s.dissipating_day),
            s.percent_immune,
            s.peak_infectious.count,
        );
    }
    out
}

/// Render a comparison as pretty JSON.
///
/// # Errors
///
/// Returns a serialization error if JSON encoding fails.
pub fn render_json(comparison: &Comparison) -> EpiResult<String> {
    Ok(serde_json::to_string_pretty(comparison)?)
}

/// Print a comparison, as a table or as JSON.
///
/// # Errors
///
/// Returns a serialization error if JSON encoding fails.
pub fn print_comparison(comparison: &Comparison, json: bool) -> EpiResult<()> {
    if json {
        println!("{}", render_json(comparison)?);
    } else {
        print!("{}", render_summary_table(&comparison.summaries));
    }
    Ok(())
}
