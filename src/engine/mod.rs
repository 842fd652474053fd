//! Epidemic state engine.
//!
//! Drives the daily recurrence of one scenario:
//! - Day-0 initialization from an immutable [`ScenarioConfig`]
//! - One [`SimulationState::advance`] per day
//! - A [`ConservationGuard`] check after every day
//! - Event narration through `tracing`

pub mod guard;
pub mod milestones;
pub mod state;

use tracing::{debug, info, instrument, trace};

pub use guard::{ConservationGuard, GuardConfig, Severity};
pub use milestones::{MilestoneConfig, MilestoneReport};
pub use state::{DailyUpdate, DayRecord, History, SimulationState};

use crate::config::ScenarioConfig;
use crate::error::EpiResult;

/// Engine for a single scenario run.
///
/// Owns its state exclusively; scenarios never share engines.
#[derive(Debug, Clone)]
pub struct EpidemicEngine {
    config: ScenarioConfig,
    state: SimulationState,
    guard: ConservationGuard,
}

impl EpidemicEngine {
    /// Create an engine at day 0 with the default guard.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the config is out of range.
    pub fn new(config: ScenarioConfig) -> EpiResult<Self> {
        Self::with_guard(config, GuardConfig::default())
    }

    /// Create an engine at day 0 with custom guard settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the config or guard settings are out of range.
    pub fn with_guard(config: ScenarioConfig, guard: GuardConfig) -> EpiResult<Self> {
        guard.ensure_valid()?;
        let state = SimulationState::initialize(&config)?;
        let mut guard = ConservationGuard::new(guard);
        guard.check(&state)?;

        Ok(Self {
            config,
            state,
            guard,
        })
    }

    /// Advance one day and verify conservation.
    ///
    /// # Errors
    ///
    /// Returns `ConservationViolation` or `NonFiniteValue` if the new state
    /// is corrupt; the run must not continue after either.
    pub fn step(&mut self) -> EpiResult<DailyUpdate> {
        let day = self.state.current_day() + 1;
        let was_dissipating = self.state.is_dissipating();
        let was_extinct = self.state.is_extinct();
        let was_relaxed = self.state.is_relaxed();

        let update = self.state.advance(&self.config, day)?;
        self.guard.check(&self.state)?;

        trace!(
            day,
            s = self.state.susceptible(),
            i = self.state.infectious(),
            r = self.state.immune(),
            d = self.state.dead(),
            "day complete"
        );

        if !was_relaxed && self.state.is_relaxed() {
            debug!(day, r0 = update.active_reproduction, "social distancing ended");
        }
        if !was_dissipating && self.state.is_dissipating() {
            debug!(
                day,
                rt = update.effective_reproduction,
                percent_immune = self.percent_immune(),
                "reproduction number below 1, virus is dissipating"
            );
        }
        if !was_extinct && self.state.is_extinct() {
            debug!(
                day,
                dead = self.state.dead(),
                percent_immune = self.percent_immune(),
                "infection gone"
            );
        }

        Ok(update)
    }

    /// Run until `max_days`, or until nothing can change when
    /// `stop_when_quiescent` is set.
    ///
    /// Extinction alone does not stop the loop; the tail stays flat. An
    /// early stop keeps a shorter history but reports the same totals and
    /// event days as a full run, including a relaxation that falls after
    /// the stop.
    ///
    /// # Errors
    ///
    /// Propagates the first guard violation.
    #[instrument(skip(self), fields(r0 = self.config.initial_reproduction_number))]
    pub fn run(&mut self) -> EpiResult<&SimulationState> {
        info!(
            max_days = self.config.max_days,
            population = self.config.total_population,
            "run starting"
        );

        while self.state.current_day() < self.config.max_days {
            if self.config.stop_when_quiescent && self.state.is_quiescent(&self.config) {
                debug!(day = self.state.current_day(), "state quiescent, stopping early");
                self.state.settle_events(&self.config)?;
                break;
            }
            self.step()?;
        }

        info!(
            days = self.state.current_day(),
            dead = self.state.dead(),
            extinction_day = ?self.state.extinction_day(),
            "run complete"
        );
        Ok(&self.state)
    }

    /// Percent immune among the living on the current day.
    #[must_use]
    pub fn percent_immune(&self) -> f64 {
        self.state
            .percent_immune_at(self.state.current_day())
            .unwrap_or(0.0)
    }

    /// Current simulated day.
    #[must_use]
    pub fn current_day(&self) -> u32 {
        self.state.current_day()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Configuration of this run.
    #[must_use]
    pub const fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Finish the run, keeping configuration and state.
    #[must_use]
    pub fn into_parts(self) -> (ScenarioConfig, SimulationState) {
        (self.config, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(max_days: u32) -> ScenarioConfig {
        ScenarioConfig {
            total_population: 100_000.0,
            initial_infectious: 10.0,
            max_days,
            ..Default::default()
        }
    }

    #[test]
    fn test_engine_new_rejects_invalid() {
        let config = ScenarioConfig {
            infectious_period_days: 0,
            ..Default::default()
        };
        assert!(EpidemicEngine::new(config).unwrap_err().is_invalid_configuration());

        let guard = GuardConfig {
            tolerance: -1.0,
            ..Default::default()
        };
        assert!(EpidemicEngine::with_guard(small(10), guard).is_err());
    }

    #[test]
    fn test_run_reaches_max_days() {
        let mut engine = EpidemicEngine::new(small(500)).unwrap();
        let state = engine.run().unwrap();
        assert_eq!(state.current_day(), 500);
        assert_eq!(state.history().len(), 501);
        assert!(state.is_extinct());
    }

    #[test]
    fn test_step_advances_one_day() {
        let mut engine = EpidemicEngine::new(small(10)).unwrap();
        let update = engine.step().unwrap();
        assert_eq!(update.day, 1);
        assert_eq!(engine.current_day(), 1);
        let update = engine.step().unwrap();
        assert_eq!(update.day, 2);
    }

    #[test]
    fn test_quiescent_stop_preserves_totals() {
        let full_config = small(600);
        let quick_config = ScenarioConfig {
            stop_when_quiescent: true,
            ..full_config.clone()
        };

        let mut full = EpidemicEngine::new(full_config).unwrap();
        full.run().unwrap();
        let mut quick = EpidemicEngine::new(quick_config).unwrap();
        quick.run().unwrap();

        assert!(quick.current_day() < full.current_day());
        assert_eq!(quick.state().extinction_day(), full.state().extinction_day());
        assert!((quick.state().dead() - full.state().dead()).abs() < f64::EPSILON);
        assert!((quick.state().immune() - full.state().immune()).abs() < f64::EPSILON);
        assert!((quick.state().susceptible() - full.state().susceptible()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quiescent_stop_reports_late_events() {
        let full_config = ScenarioConfig {
            initial_reproduction_number: 3.0,
            relaxed_reproduction_number: 0.5,
            social_distancing_cutoff_day: Some(500),
            relax_on_extinction: false,
            ..small(600)
        };
        let quick_config = ScenarioConfig {
            stop_when_quiescent: true,
            ..full_config.clone()
        };

        let mut full = EpidemicEngine::new(full_config).unwrap();
        full.run().unwrap();
        let mut quick = EpidemicEngine::new(quick_config).unwrap();
        quick.run().unwrap();

        assert!(quick.current_day() < 500);
        assert_eq!(full.state().relaxed_day(), Some(501));
        assert_eq!(quick.state().relaxed_day(), full.state().relaxed_day());
        assert_eq!(quick.state().dissipating_day(), full.state().dissipating_day());
        assert_eq!(quick.state().extinction_day(), full.state().extinction_day());
    }

    #[test]
    fn test_quiescent_zero_seed_matches_full_run() {
        let full_config = ScenarioConfig {
            initial_infectious: 0.0,
            initial_reproduction_number: 2.5,
            relaxed_reproduction_number: 0.8,
            ..small(50)
        };
        let quick_config = ScenarioConfig {
            stop_when_quiescent: true,
            ..full_config.clone()
        };

        let mut full = EpidemicEngine::new(full_config).unwrap();
        full.run().unwrap();
        let mut quick = EpidemicEngine::new(quick_config).unwrap();
        quick.run().unwrap();

        assert_eq!(quick.current_day(), 0);
        assert_eq!(full.state().relaxed_day(), Some(1));
        assert_eq!(full.state().dissipating_day(), Some(1));
        assert_eq!(quick.state().relaxed_day(), Some(1));
        assert_eq!(quick.state().dissipating_day(), Some(1));
    }

    #[test]
    fn test_quiescent_stop_waits_for_waning() {
        let config = ScenarioConfig {
            immunity_duration_days: 90,
            immunity_loss_fraction: 0.3,
            stop_when_quiescent: true,
            ..small(800)
        };
        let mut engine = EpidemicEngine::new(config.clone()).unwrap();
        engine.run().unwrap();
        let stopped = engine.current_day();

        let mut full = EpidemicEngine::new(ScenarioConfig {
            stop_when_quiescent: false,
            ..config
        })
        .unwrap();
        full.run().unwrap();

        if stopped < 800 {
            let extinct = full.state().extinction_day().unwrap();
            assert!(stopped >= extinct + 90 - 14);
        }
        assert!((engine.state().immune() - full.state().immune()).abs() < 1e-6);
        assert!((engine.state().susceptible() - full.state().susceptible()).abs() < 1e-6);
    }

    #[test]
    fn test_into_parts() {
        let mut engine = EpidemicEngine::new(small(30)).unwrap();
        engine.run().unwrap();
        let (config, state) = engine.into_parts();
        assert_eq!(config.max_days, 30);
        assert_eq!(state.current_day(), 30);
    }
}
