//! Outbreak state and the daily recurrence.
//!
//! The state holds four running totals (susceptible, infectious, immune,
//! dead) plus an append-only history indexed by day. The history is what
//! makes the delays work: a cohort infected on day `t` stops being
//! infectious on day `t + infectious_period_days`, and a cohort recovered on
//! day `t` may lose immunity on day `t + immunity_duration_days`.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::error::{EpiError, EpiResult};

/// One day's compartments, as handed to plotters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Day index (0 = initial state).
    pub day: u32,
    /// Susceptible count.
    pub susceptible: f64,
    /// Infectious count.
    pub infectious: f64,
    /// Immune (recovered) count.
    pub immune: f64,
    /// Cumulative dead.
    pub dead: f64,
}

/// Everything that happened on one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyUpdate {
    /// Day index.
    pub day: u32,
    /// Reproduction number in force before susceptible depletion.
    pub active_reproduction: f64,
    /// Active R0 scaled by the remaining susceptible fraction.
    pub effective_reproduction: f64,
    /// New infections today.
    pub newly_infected: f64,
    /// Cohort members who recovered today.
    pub newly_recovered: f64,
    /// Cohort members who died today.
    pub newly_dead: f64,
    /// Recovered individuals who became susceptible again today.
    pub newly_lost_immunity: f64,
}

/// Append-only per-day sequences.
///
/// Every sequence has one entry per simulated day, day 0 included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    susceptible: Vec<f64>,
    infectious: Vec<f64>,
    immune: Vec<f64>,
    dead: Vec<f64>,
    newly_infected: Vec<f64>,
    newly_recovered: Vec<f64>,
    newly_dead: Vec<f64>,
    newly_lost_immunity: Vec<f64>,
    effective_reproduction: Vec<f64>,
}

impl History {
    fn push(
        &mut self,
        susceptible: f64,
        infectious: f64,
        immune: f64,
        dead: f64,
        update: &DailyUpdate,
    ) {
        self.susceptible.push(susceptible);
        self.infectious.push(infectious);
        self.immune.push(immune);
        self.dead.push(dead);
        self.newly_infected.push(update.newly_infected);
        self.newly_recovered.push(update.newly_recovered);
        self.newly_dead.push(update.newly_dead);
        self.newly_lost_immunity.push(update.newly_lost_immunity);
        self.effective_reproduction.push(update.effective_reproduction);
    }

    /// Number of recorded days (day 0 included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.susceptible.len()
    }

    /// True before day 0 has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.susceptible.is_empty()
    }

    /// Susceptible count per day.
    #[must_use]
    pub fn susceptible(&self) -> &[f64] {
        &self.susceptible
    }

    /// Infectious count per day.
    #[must_use]
    pub fn infectious(&self) -> &[f64] {
        &self.infectious
    }

    /// Immune count per day.
    #[must_use]
    pub fn immune(&self) -> &[f64] {
        &self.immune
    }

    /// Cumulative dead per day.
    #[must_use]
    pub fn dead(&self) -> &[f64] {
        &self.dead
    }

    /// New infections per day. Day 0 holds the seed cohort.
    #[must_use]
    pub fn newly_infected(&self) -> &[f64] {
        &self.newly_infected
    }

    /// Recoveries per day.
    #[must_use]
    pub fn newly_recovered(&self) -> &[f64] {
        &self.newly_recovered
    }

    /// Deaths per day.
    #[must_use]
    pub fn newly_dead(&self) -> &[f64] {
        &self.newly_dead
    }

    /// Immunity losses per day.
    #[must_use]
    pub fn newly_lost_immunity(&self) -> &[f64] {
        &self.newly_lost_immunity
    }

    /// Effective reproduction number per day.
    #[must_use]
    pub fn effective_reproduction(&self) -> &[f64] {
        &self.effective_reproduction
    }

    /// Compartments of a single day.
    #[must_use]
    pub fn record(&self, day: u32) -> Option<DayRecord> {
        let i = day as usize;
        Some(DayRecord {
            day,
            susceptible: *self.susceptible.get(i)?,
            infectious: *self.infectious.get(i)?,
            immune: *self.immune.get(i)?,
            dead: *self.dead.get(i)?,
        })
    }

    /// Iterate over all recorded days in order.
    pub fn records(&self) -> impl Iterator<Item = DayRecord> + '_ {
        (0..self.len()).map(|i| DayRecord {
            day: i as u32,
            susceptible: self.susceptible[i],
            infectious: self.infectious[i],
            immune: self.immune[i],
            dead: self.dead[i],
        })
    }
}

/// `series[day - delay]`, or zero while no cohort that old exists.
fn delayed(series: &[f64], day: u32, delay: u32) -> f64 {
    if delay == 0 || day < delay {
        return 0.0;
    }
    series.get((day - delay) as usize).copied().unwrap_or(0.0)
}

/// True if any of the last `window` entries up to and including `day` is nonzero.
fn any_pending(series: &[f64], day: usize, window: u32) -> bool {
    let start = (day + 1).saturating_sub(window as usize);
    series
        .get(start..=day)
        .is_some_and(|recent| recent.iter().any(|v| v.abs() > 0.0))
}

/// Mutable state of one running scenario.
///
/// Created from a [`ScenarioConfig`] at day 0 and advanced one day at a
/// time; never shared between scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    total_population: f64,
    susceptible: f64,
    infectious: f64,
    immune: f64,
    dead: f64,
    history: History,
    relaxed: bool,
    dissipating_day: Option<u32>,
    extinction_day: Option<u32>,
    relaxed_day: Option<u32>,
}

impl SimulationState {
    /// Create the day-0 state.
    ///
    /// A zero seed means the infection is gone from the start, so
    /// extinction is recorded on day 0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the config violates any constraint.
    pub fn initialize(config: &ScenarioConfig) -> EpiResult<Self> {
        config.ensure_valid()?;

        let susceptible = config.initial_susceptible();
        let infectious = config.initial_infectious;

        let mut state = Self {
            total_population: config.total_population,
            susceptible,
            infectious,
            immune: 0.0,
            dead: 0.0,
            history: History::default(),
            relaxed: false,
            dissipating_day: None,
            extinction_day: (infectious <= 0.0).then_some(0),
            relaxed_day: None,
        };

        let seed = DailyUpdate {
            day: 0,
            active_reproduction: config.initial_reproduction_number,
            effective_reproduction: config.initial_reproduction_number,
            newly_infected: infectious,
            newly_recovered: 0.0,
            newly_dead: 0.0,
            newly_lost_immunity: 0.0,
        };
        state
            .history
            .push(susceptible, infectious, 0.0, 0.0, &seed);

        Ok(state)
    }

    /// Advance the recurrence to `day`, which must directly follow the
    /// current day.
    ///
    /// This is the raw update; the population-conservation check is
    /// applied by the engine's guard after each call.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `day` is not the next day.
    pub fn advance(&mut self, config: &ScenarioConfig, day: u32) -> EpiResult<DailyUpdate> {
        let expected = self.current_day() + 1;
        if day != expected {
            return Err(EpiError::invalid(format!(
                "step to day {day} but next day is {expected}"
            )));
        }

        let initial_susceptible = self.initial_susceptible()?;
        let active_reproduction = self.update_relaxation(config, day);
        let effective_reproduction = active_reproduction * self.susceptible / initial_susceptible;
        self.note_dissipation(day, effective_reproduction);

        let period = config.infectious_period_days;
        let newly_infected = self.infectious * effective_reproduction / f64::from(period);

        let cohort = delayed(&self.history.newly_infected, day, period);
        let newly_recovered = (1.0 - config.death_rate) * cohort;
        let newly_dead = config.death_rate * cohort;

        let newly_lost_immunity = config.immunity_loss_fraction
            * delayed(
                &self.history.newly_recovered,
                day,
                config.immunity_duration_days,
            );

        let previous_infectious = self.infectious;
        self.susceptible += newly_lost_immunity - newly_infected;
        self.infectious += newly_infected - newly_recovered - newly_dead;
        self.immune += newly_recovered - newly_lost_immunity;
        self.dead += newly_dead;

        // A fraction of a person cannot sustain transmission.
        if self.infectious < 1.0 {
            if previous_infectious > 0.0 && self.extinction_day.is_none() {
                self.extinction_day = Some(day);
            }
            self.infectious = 0.0;
        }

        let update = DailyUpdate {
            day,
            active_reproduction,
            effective_reproduction,
            newly_infected,
            newly_recovered,
            newly_dead,
            newly_lost_immunity,
        };
        self.history.push(
            self.susceptible,
            self.infectious,
            self.immune,
            self.dead,
            &update,
        );

        Ok(update)
    }

    /// Record the event days a full run would still reach after the state
    /// became quiescent, without extending the history.
    ///
    /// Compartments are frozen from here on, so only the relaxation switch
    /// and the effective reproduction number it changes are left to happen.
    /// Replays the same trigger logic as [`Self::advance`] up to `max_days`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the history has no day 0.
    pub fn settle_events(&mut self, config: &ScenarioConfig) -> EpiResult<()> {
        let initial_susceptible = self.initial_susceptible()?;
        for day in self.current_day() + 1..=config.max_days {
            if self.relaxed && self.dissipating_day.is_some() {
                break;
            }
            let active_reproduction = self.update_relaxation(config, day);
            self.note_dissipation(
                day,
                active_reproduction * self.susceptible / initial_susceptible,
            );
        }
        Ok(())
    }

    fn initial_susceptible(&self) -> EpiResult<f64> {
        self.history
            .susceptible
            .first()
            .copied()
            .ok_or_else(|| EpiError::invalid("state has no day-0 record"))
    }

    /// Apply the relaxation triggers for the step producing `day` and
    /// return the active reproduction number.
    fn update_relaxation(&mut self, config: &ScenarioConfig, day: u32) -> f64 {
        // Two edge triggers feed one one-way flag.
        if !self.relaxed {
            let observed_gone = config.relax_on_extinction && self.extinction_day.is_some();
            if config.cutoff_reached(day) || observed_gone {
                self.relaxed = true;
                self.relaxed_day = Some(day);
            }
        }

        if self.relaxed {
            config.relaxed_reproduction_number
        } else {
            config.initial_reproduction_number
        }
    }

    fn note_dissipation(&mut self, day: u32, effective_reproduction: f64) {
        if self.dissipating_day.is_none() && effective_reproduction < 1.0 {
            self.dissipating_day = Some(day);
        }
    }

    /// Whether no future day can change any compartment.
    ///
    /// Requires zero infectious, no infection cohort still inside its
    /// infectious window, and (with waning) no recovered cohort still inside
    /// its immunity window.
    #[must_use]
    pub fn is_quiescent(&self, config: &ScenarioConfig) -> bool {
        if self.infectious > 0.0 {
            return false;
        }
        let day = self.current_day() as usize;
        if any_pending(
            &self.history.newly_infected,
            day,
            config.infectious_period_days,
        ) {
            return false;
        }
        if config.has_waning_immunity()
            && any_pending(
                &self.history.newly_recovered,
                day,
                config.immunity_duration_days,
            )
        {
            return false;
        }
        true
    }

    /// Latest recorded day.
    #[must_use]
    pub fn current_day(&self) -> u32 {
        self.history.len().saturating_sub(1) as u32
    }

    /// Closed-population size.
    #[must_use]
    pub const fn total_population(&self) -> f64 {
        self.total_population
    }

    /// Current susceptible count.
    #[must_use]
    pub const fn susceptible(&self) -> f64 {
        self.susceptible
    }

    /// Current infectious count.
    #[must_use]
    pub const fn infectious(&self) -> f64 {
        self.infectious
    }

    /// Current immune count.
    #[must_use]
    pub const fn immune(&self) -> f64 {
        self.immune
    }

    /// Current cumulative dead.
    #[must_use]
    pub const fn dead(&self) -> f64 {
        self.dead
    }

    /// S + I + R + D.
    #[must_use]
    pub fn population_sum(&self) -> f64 {
        self.susceptible + self.infectious + self.immune + self.dead
    }

    /// Named running totals.
    #[must_use]
    pub const fn compartments(&self) -> [(&'static str, f64); 4] {
        [
            ("susceptible", self.susceptible),
            ("infectious", self.infectious),
            ("immune", self.immune),
            ("dead", self.dead),
        ]
    }

    /// Per-day history.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Consume the state, keeping only its history.
    #[must_use]
    pub fn into_history(self) -> History {
        self.history
    }

    /// Whether distancing has ended.
    #[must_use]
    pub const fn is_relaxed(&self) -> bool {
        self.relaxed
    }

    /// Whether the effective reproduction number has dropped below 1.
    #[must_use]
    pub const fn is_dissipating(&self) -> bool {
        self.dissipating_day.is_some()
    }

    /// Whether the infectious count has reached zero.
    #[must_use]
    pub const fn is_extinct(&self) -> bool {
        self.extinction_day.is_some()
    }

    /// First day the effective reproduction number was below 1.
    ///
    /// This is the day the step produces (history index), so the value is
    /// computed from the susceptible count of the previous day. A loop that
    /// numbers steps from 0 would report one day less.
    #[must_use]
    pub const fn dissipating_day(&self) -> Option<u32> {
        self.dissipating_day
    }

    /// First day the infectious count reached zero.
    #[must_use]
    pub const fn extinction_day(&self) -> Option<u32> {
        self.extinction_day
    }

    /// First day the relaxed reproduction number was in force.
    ///
    /// For a cutoff of `n` this is day `n + 1`.
    #[must_use]
    pub const fn relaxed_day(&self) -> Option<u32> {
        self.relaxed_day
    }

    /// 100 × immune ÷ (population − dead) on `day`.
    #[must_use]
    pub fn percent_immune_at(&self, day: u32) -> Option<f64> {
        let record = self.history.record(day)?;
        let living = self.total_population - record.dead;
        (living > 0.0).then(|| 100.0 * record.immune / living)
    }

    /// Day and size of the largest infectious count.
    #[must_use]
    pub fn peak_infectious(&self) -> (u32, f64) {
        self.history
            .infectious
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |(best_day, best), (day, &value)| {
                if value > best {
                    (day as u32, value)
                } else {
                    (best_day, best)
                }
            })
    }

    #[cfg(test)]
    pub(crate) fn perturb_dead(&mut self, delta: f64) {
        self.dead += delta;
    }
}
