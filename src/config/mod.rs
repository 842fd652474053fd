//! Configuration system with YAML schema and validation.
//!
//! Mistakes are caught before any simulated day runs:
//! - Type-safe configuration structs
//! - Range validation via `validator`
//! - Semantic validation (finiteness, seed smaller than population)

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::engine::guard::GuardConfig;
use crate::engine::milestones::MilestoneConfig;
use crate::error::{EpiError, EpiResult};
use crate::scenarios::Scenario;

/// Parameters of a single outbreak scenario.
///
/// Immutable once a run starts. Every field has a default taken from the
/// reference baseline (US-sized population, R0 = 2.5, 14 infectious days,
/// 1% death rate, no waning immunity, 1000 days), so YAML studies only
/// need to list what they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// R0 while social distancing is in effect.
    #[validate(range(min = 0.0))]
    pub initial_reproduction_number: f64,
    /// R0 once distancing ends.
    #[validate(range(min = 0.0))]
    pub relaxed_reproduction_number: f64,
    /// Last day of distancing; the relaxed R0 is forced from the next day.
    /// `None` means never.
    pub social_distancing_cutoff_day: Option<u32>,
    /// End distancing once the infection is observed gone.
    pub relax_on_extinction: bool,
    /// Closed-population size.
    #[validate(range(exclusive_min = 0.0))]
    pub total_population: f64,
    /// Seed infections at day 0.
    #[validate(range(min = 0.0))]
    pub initial_infectious: f64,
    /// Days between becoming infectious and recovering or dying.
    #[validate(range(min = 1))]
    pub infectious_period_days: u32,
    /// Fraction of those ceasing to be infectious who die.
    #[validate(range(min = 0.0, max = 1.0))]
    pub death_rate: f64,
    /// Days between recovering and possibly losing immunity (0 = never).
    pub immunity_duration_days: u32,
    /// Fraction of a recovered cohort that becomes susceptible again.
    #[validate(range(min = 0.0, max = 1.0))]
    pub immunity_loss_fraction: f64,
    /// Hard cap on simulated days.
    #[validate(range(min = 1))]
    pub max_days: u32,
    /// Stop once nothing can change any more (same totals, shorter series).
    pub stop_when_quiescent: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            initial_reproduction_number: 2.5,
            relaxed_reproduction_number: 2.5,
            social_distancing_cutoff_day: None,
            relax_on_extinction: true,
            total_population: 330e6,
            initial_infectious: 1.0,
            infectious_period_days: 14,
            death_rate: 0.01,
            immunity_duration_days: 0,
            immunity_loss_fraction: 0.0,
            max_days: 1000,
            stop_when_quiescent: false,
        }
    }
}

impl ScenarioConfig {
    /// Create a builder starting from the baseline configuration.
    #[must_use]
    pub fn builder() -> ScenarioConfigBuilder {
        ScenarioConfigBuilder::default()
    }

    /// Validate ranges and semantic constraints.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first offending parameter.
    pub fn ensure_valid(&self) -> EpiResult<()> {
        self.validate_semantic()?;
        self.validate()?;
        Ok(())
    }

    /// Constraints the range attributes cannot express.
    fn validate_semantic(&self) -> EpiResult<()> {
        let reals = [
            ("initial_reproduction_number", self.initial_reproduction_number),
            ("relaxed_reproduction_number", self.relaxed_reproduction_number),
            ("total_population", self.total_population),
            ("initial_infectious", self.initial_infectious),
            ("death_rate", self.death_rate),
            ("immunity_loss_fraction", self.immunity_loss_fraction),
        ];
        for (name, value) in reals {
            if !value.is_finite() {
                return Err(EpiError::invalid(format!("{name} must be finite, got {value}")));
            }
        }

        if self.initial_infectious >= self.total_population {
            return Err(EpiError::invalid(format!(
                "initial_infectious ({}) must be smaller than total_population ({})",
                self.initial_infectious, self.total_population
            )));
        }

        Ok(())
    }

    /// Susceptible count at day 0.
    #[must_use]
    pub fn initial_susceptible(&self) -> f64 {
        self.total_population - self.initial_infectious
    }

    /// Whether recovered individuals can become susceptible again.
    #[must_use]
    pub fn has_waning_immunity(&self) -> bool {
        self.immunity_duration_days > 0 && self.immunity_loss_fraction > 0.0
    }

    /// Whether the step that produces `day` runs after the cutoff.
    ///
    /// The step producing `day` starts from day `day - 1`, so a cutoff of
    /// `n` keeps distancing for `n` steps and relaxes from day `n + 1`.
    #[must_use]
    pub fn cutoff_reached(&self, day: u32) -> bool {
        self.social_distancing_cutoff_day
            .is_some_and(|cutoff| day > cutoff)
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct ScenarioConfigBuilder {
    config: ScenarioConfig,
}

impl ScenarioConfigBuilder {
    /// Use the same R0 with and without distancing.
    #[must_use]
    pub const fn reproduction_number(mut self, r0: f64) -> Self {
        self.config.initial_reproduction_number = r0;
        self.config.relaxed_reproduction_number = r0;
        self
    }

    /// Set the R0 while distancing is in effect.
    #[must_use]
    pub const fn initial_reproduction_number(mut self, r0: f64) -> Self {
        self.config.initial_reproduction_number = r0;
        self
    }

    /// Set the R0 once distancing ends.
    #[must_use]
    pub const fn relaxed_reproduction_number(mut self, r0: f64) -> Self {
        self.config.relaxed_reproduction_number = r0;
        self
    }

    /// Force the relaxed R0 from `day` on.
    #[must_use]
    pub const fn social_distancing_cutoff_day(mut self, day: u32) -> Self {
        self.config.social_distancing_cutoff_day = Some(day);
        self
    }

    /// Enable or disable relaxation once the infection is gone.
    #[must_use]
    pub const fn relax_on_extinction(mut self, relax: bool) -> Self {
        self.config.relax_on_extinction = relax;
        self
    }

    /// Set the closed-population size.
    #[must_use]
    pub const fn total_population(mut self, population: f64) -> Self {
        self.config.total_population = population;
        self
    }

    /// Set the seed infection count.
    #[must_use]
    pub const fn initial_infectious(mut self, infectious: f64) -> Self {
        self.config.initial_infectious = infectious;
        self
    }

    /// Set the infectious period in days.
    #[must_use]
    pub const fn infectious_period_days(mut self, days: u32) -> Self {
        self.config.infectious_period_days = days;
        self
    }

    /// Set the death rate.
    #[must_use]
    pub const fn death_rate(mut self, rate: f64) -> Self {
        self.config.death_rate = rate;
        self
    }

    /// Enable waning immunity.
    #[must_use]
    pub const fn waning_immunity(mut self, duration_days: u32, loss_fraction: f64) -> Self {
        self.config.immunity_duration_days = duration_days;
        self.config.immunity_loss_fraction = loss_fraction;
        self
    }

    /// Set the simulated-day cap.
    #[must_use]
    pub const fn max_days(mut self, days: u32) -> Self {
        self.config.max_days = days;
        self
    }

    /// Stop early once the state can no longer change.
    #[must_use]
    pub const fn stop_when_quiescent(mut self, stop: bool) -> Self {
        self.config.stop_when_quiescent = stop;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any parameter is out of range.
    pub fn build(self) -> EpiResult<ScenarioConfig> {
        self.config.ensure_valid()?;
        Ok(self.config)
    }
}

/// How a study's scenarios are executed and post-processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Run scenarios on the rayon pool.
    pub parallel: bool,
    /// Death milestones reported per scenario.
    pub milestones: MilestoneConfig,
    /// Conservation guard settings.
    pub guard: GuardConfig,
}

/// A set of scenarios compared side by side.
///
/// Loaded from YAML files with full validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// Schema version for forward compatibility.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Study name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Scenarios in presentation order.
    pub scenarios: Vec<Scenario>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl StudyConfig {
    /// Create a study from scenarios with default runner settings.
    #[must_use]
    pub fn new(name: impl Into<String>, scenarios: Vec<Scenario>) -> Self {
        Self {
            schema_version: default_schema_version(),
            name: name.into(),
            description: String::new(),
            runner: RunnerConfig::default(),
            scenarios,
        }
    }

    /// Load a study from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Any scenario fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> EpiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a study from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> EpiResult<Self> {
        let study: Self = serde_yaml::from_str(yaml)?;
        study.ensure_valid()?;
        Ok(study)
    }

    /// Serialize the study back to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> EpiResult<String> {
        serde_yaml::to_string(self).map_err(|e| EpiError::serialization(e.to_string()))
    }

    /// Validate every scenario.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` prefixed with the scenario label.
    pub fn ensure_valid(&self) -> EpiResult<()> {
        if self.scenarios.is_empty() {
            return Err(EpiError::invalid("study has no scenarios"));
        }
        for scenario in &self.scenarios {
            scenario.config.ensure_valid().map_err(|e| match e {
                EpiError::InvalidConfiguration { message } => {
                    EpiError::invalid(format!("scenario '{}': {message}", scenario.label))
                }
                other => other,
            })?;
        }
        self.runner.guard.ensure_valid()?;
        Ok(())
    }
}
