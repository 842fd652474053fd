//! Scenario orchestration.
//!
//! Runs one independent engine per scenario, keeps results in input order,
//! and prepares them for side-by-side comparison. A failing scenario only
//! fails its own slot.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span};

use crate::config::{RunnerConfig, ScenarioConfig};
use crate::engine::{DayRecord, EpidemicEngine, History, MilestoneReport};
use crate::error::EpiResult;
use crate::scenarios::{LineStyle, Scenario};

/// Largest infectious count of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakInfectious {
    /// Day of the peak.
    pub day: u32,
    /// Infectious count on that day.
    pub count: f64,
}

/// Outcome of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Caller-supplied label.
    pub label: String,
    /// Display hint, passed through.
    pub line_style: LineStyle,
    /// Parameters of the run.
    pub config: ScenarioConfig,
    /// Full per-day history, day 0 included.
    pub history: History,
    /// Number of days stepped.
    pub days_simulated: u32,
    /// First day the infection was gone (herd immunity day).
    pub extinction_day: Option<u32>,
    /// First day the effective reproduction number was below 1.
    pub dissipating_day: Option<u32>,
    /// First day the relaxed reproduction number was in force.
    pub relaxed_day: Option<u32>,
    /// Cumulative dead at extinction, or on the last day if never extinct.
    pub total_dead: f64,
    /// Percent of the living who are immune, on the same day as `total_dead`.
    pub percent_immune: f64,
    /// Largest infectious count.
    pub peak_infectious: PeakInfectious,
    /// Death milestones.
    pub milestones: MilestoneReport,
}

impl ScenarioResult {
    fn from_engine(scenario: &Scenario, engine: EpidemicEngine, runner: &RunnerConfig) -> Self {
        let (config, state) = engine.into_parts();
        let days_simulated = state.current_day();
        let reference_day = state.extinction_day().unwrap_or(days_simulated);
        let (peak_day, peak_count) = state.peak_infectious();
        let total_dead = state
            .history()
            .record(reference_day)
            .map_or(state.dead(), |record| record.dead);
        let percent_immune = state.percent_immune_at(reference_day).unwrap_or(0.0);
        let milestones =
            MilestoneReport::from_dead_series(state.history().dead(), &runner.milestones);

        Self {
            label: scenario.label.clone(),
            line_style: scenario.line_style,
            config,
            extinction_day: state.extinction_day(),
            dissipating_day: state.dissipating_day(),
            relaxed_day: state.relaxed_day(),
            history: state.into_history(),
            days_simulated,
            total_dead,
            percent_immune,
            peak_infectious: PeakInfectious {
                day: peak_day,
                count: peak_count,
            },
            milestones,
        }
    }

    /// Per-day compartments, day 0 through `days_simulated`.
    pub fn points(&self) -> impl Iterator<Item = DayRecord> + '_ {
        self.history.records()
    }

    /// Number of recorded days (`days_simulated + 1`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Always false for a finished run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Runs scenarios with shared runner settings.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    /// Create a runner.
    #[must_use]
    pub const fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runner settings.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a single scenario to completion.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for bad parameters, or a guard
    /// violation if the run corrupts its state.
    pub fn run_one(&self, scenario: &Scenario) -> EpiResult<ScenarioResult> {
        let span = info_span!("scenario", label = %scenario.label);
        let _enter = span.enter();

        let mut engine =
            EpidemicEngine::with_guard(scenario.config.clone(), self.config.guard.clone())?;
        let outcome = engine.run().map(|_| ());
        if let Err(e) = outcome {
            error!(error = %e, day = engine.current_day(), "scenario aborted");
            return Err(e);
        }
        let result = ScenarioResult::from_engine(scenario, engine, &self.config);

        info!(
            total_dead = result.total_dead,
            extinction_day = ?result.extinction_day,
            percent_immune = result.percent_immune,
            "scenario finished"
        );
        Ok(result)
    }

    /// Run scenarios one after another, results in input order.
    #[must_use]
    pub fn run(&self, scenarios: &[Scenario]) -> Vec<EpiResult<ScenarioResult>> {
        scenarios.iter().map(|s| self.run_one(s)).collect()
    }

    /// Run scenarios on the rayon pool, results in input order.
    #[must_use]
    pub fn run_parallel(&self, scenarios: &[Scenario]) -> Vec<EpiResult<ScenarioResult>> {
        scenarios.par_iter().map(|s| self.run_one(s)).collect()
    }

    /// Run with the strategy chosen in the runner settings.
    #[must_use]
    pub fn execute(&self, scenarios: &[Scenario]) -> Vec<EpiResult<ScenarioResult>> {
        if self.config.parallel {
            self.run_parallel(scenarios)
        } else {
            self.run(scenarios)
        }
    }

    /// Run every scenario and fail on the first error.
    ///
    /// # Errors
    ///
    /// Returns the first scenario error in input order.
    pub fn run_all(&self, scenarios: &[Scenario]) -> EpiResult<Vec<ScenarioResult>> {
        self.execute(scenarios).into_iter().collect()
    }
}

/// Series of one scenario padded to a common length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    /// Scenario label.
    pub label: String,
    /// Display hint.
    pub line_style: LineStyle,
    /// Susceptible per day.
    pub susceptible: Vec<f64>,
    /// Infectious per day.
    pub infectious: Vec<f64>,
    /// Immune per day.
    pub immune: Vec<f64>,
    /// Dead per day.
    pub dead: Vec<f64>,
}

impl AlignedSeries {
    /// Common length of the four series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.susceptible.len()
    }

    /// True if no day is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.susceptible.is_empty()
    }
}

fn pad(series: &[f64], len: usize) -> Vec<f64> {
    let mut padded = series.to_vec();
    if let Some(&last) = series.last() {
        padded.resize(len.max(series.len()), last);
    }
    padded
}

/// Pad every series by repeating its final value up to the longest length.
///
/// Presentation only: scalars on the results are not touched.
#[must_use]
pub fn align(results: &[ScenarioResult]) -> Vec<AlignedSeries> {
    let len = results.iter().map(ScenarioResult::len).max().unwrap_or(0);
    results
        .iter()
        .map(|result| AlignedSeries {
            label: result.label.clone(),
            line_style: result.line_style,
            susceptible: pad(result.history.susceptible(), len),
            infectious: pad(result.history.infectious(), len),
            immune: pad(result.history.immune(), len),
            dead: pad(result.history.dead(), len),
        })
        .collect()
}

/// Headline numbers of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// Scenario label.
    pub label: String,
    /// R0 while distancing.
    pub initial_reproduction_number: f64,
    /// Cumulative dead at extinction (or at the last day).
    pub total_dead: f64,
    /// Day the infection was gone.
    pub herd_immunity_day: Option<u32>,
    /// Day the effective reproduction number fell below 1.
    pub dissipating_day: Option<u32>,
    /// Percent immune among the living.
    pub percent_immune: f64,
    /// Largest infectious count.
    pub peak_infectious: PeakInfectious,
    /// Days from the first to the second death milestone.
    pub days_between_milestones: Option<u32>,
}

/// Summaries in input order.
#[must_use]
pub fn summarize(results: &[ScenarioResult]) -> Vec<ScenarioSummary> {
    results
        .iter()
        .map(|result| ScenarioSummary {
            label: result.label.clone(),
            initial_reproduction_number: result.config.initial_reproduction_number,
            total_dead: result.total_dead,
            herd_immunity_day: result.extinction_day,
            dissipating_day: result.dissipating_day,
            percent_immune: result.percent_immune,
            peak_infectious: result.peak_infectious,
            days_between_milestones: result.milestones.days_between(),
        })
        .collect()
}

/// Everything a reporter needs: summaries plus aligned series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Per-scenario headline numbers.
    pub summaries: Vec<ScenarioSummary>,
    /// Series padded to a common length.
    pub series: Vec<AlignedSeries>,
}

impl Comparison {
    /// Build a comparison from finished runs.
    #[must_use]
    pub fn from_results(results: &[ScenarioResult]) -> Self {
        Self {
            summaries: summarize(results),
            series: align(results),
        }
    }
}
