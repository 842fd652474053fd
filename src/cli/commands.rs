//! CLI command handlers.

use std::path::Path;
use std::process::ExitCode;

use tracing::error;

use crate::config::{RunnerConfig, StudyConfig};
use crate::error::EpiResult;
use crate::scenarios::{reference_comparison, Comparison, Scenario, ScenarioRunner};

use super::output::{print_comparison, print_help, print_version};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run {
            study_path,
            parallel,
            json,
        } => run_study(&study_path, parallel, json),
        Command::Compare { json } => run_reference(json),
        Command::Validate { study_path } => validate_study(&study_path),
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Run every scenario and build the comparison.
///
/// Fails if any scenario fails; the other scenarios still run to completion
/// and their errors are logged individually.
///
/// # Errors
///
/// Returns the first scenario error in input order.
pub fn compare(runner: &ScenarioRunner, scenarios: &[Scenario]) -> EpiResult<Comparison> {
    let outcomes = runner.execute(scenarios);
    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_error = None;

    for (scenario, outcome) in scenarios.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(label = %scenario.label, error = %e, "scenario failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(Comparison::from_results(&results)),
    }
}

/// Run a study from a YAML file.
#[must_use]
pub fn run_study(path: &Path, parallel: bool, json: bool) -> ExitCode {
    let study = match StudyConfig::load(path) {
        Ok(study) => study,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut runner_config = study.runner.clone();
    runner_config.parallel |= parallel;
    let runner = ScenarioRunner::new(runner_config);

    if !json {
        println!("Study: {} ({} scenarios)\n", study.name, study.scenarios.len());
    }
    finish(compare(&runner, &study.scenarios), json)
}

/// Run the built-in reference comparison.
#[must_use]
pub fn run_reference(json: bool) -> ExitCode {
    let runner = ScenarioRunner::new(RunnerConfig {
        parallel: true,
        ..RunnerConfig::default()
    });
    finish(compare(&runner, &reference_comparison()), json)
}

fn finish(comparison: EpiResult<Comparison>, json: bool) -> ExitCode {
    match comparison.and_then(|c| print_comparison(&c, json)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Validate a study YAML file without running it.
#[must_use]
pub fn validate_study(path: &Path) -> ExitCode {
    match StudyConfig::load(path) {
        Ok(study) => {
            println!(
                "✓ {}: {} scenarios valid",
                path.display(),
                study.scenarios.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}: {e}", path.display());
            ExitCode::from(2)
        }
    }
}
