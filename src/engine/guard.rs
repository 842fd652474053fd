//! Population-conservation guard.
//!
//! Runs after every simulated day and stops the scenario as soon as the
//! state is corrupt:
//!
//! 1. **Non-finite values**: NaN or Inf in any compartment
//! 2. **Conservation drift**: S + I + R + D differs from the closed
//!    population by more than the tolerance
//!
//! Drift is classified with graduated severity so that a run approaching
//! the tolerance is logged before it fails. Snapping the last fractional
//! case to zero moves up to one person out of the sum until the pending
//! cohorts graduate, so drift just under the tolerance is expected.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::state::SimulationState;
use crate::error::{EpiError, EpiResult};

/// Severity of a conservation drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Within tolerance, continue.
    Acceptable,
    /// Approaching tolerance, log and continue.
    Warning,
    /// Tolerance exceeded, stop the run.
    Critical,
    /// Drift is NaN or infinite, stop the run.
    Fatal,
}

/// Guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    /// Maximum absolute drift of the population sum, in people.
    pub tolerance: f64,
    /// Warn once drift exceeds this fraction of the tolerance.
    pub warning_fraction: f64,
    /// NaN/Inf detection enabled.
    pub check_finite: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            warning_fraction: 0.8,
            check_finite: true,
        }
    }
}

impl GuardConfig {
    /// Validate guard settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if tolerance or warning fraction is out of range.
    pub fn ensure_valid(&self) -> EpiResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(EpiError::invalid(format!(
                "guard tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.warning_fraction) {
            return Err(EpiError::invalid(format!(
                "guard warning_fraction must be in [0, 1], got {}",
                self.warning_fraction
            )));
        }
        Ok(())
    }

    /// Classify an absolute drift.
    #[must_use]
    pub fn classify(&self, drift: f64) -> Severity {
        let drift = drift.abs();
        if !drift.is_finite() {
            Severity::Fatal
        } else if drift > self.tolerance {
            Severity::Critical
        } else if drift > self.tolerance * self.warning_fraction {
            Severity::Warning
        } else {
            Severity::Acceptable
        }
    }
}

/// Guard checked after every step.
#[derive(Debug, Clone, Default)]
pub struct ConservationGuard {
    config: GuardConfig,
    warned_drift: bool,
    warned_negative: bool,
}

impl ConservationGuard {
    /// Create a new guard.
    #[must_use]
    pub const fn new(config: GuardConfig) -> Self {
        Self {
            config,
            warned_drift: false,
            warned_negative: false,
        }
    }

    /// Inspect the latest day of `state`.
    ///
    /// # Errors
    ///
    /// - `NonFiniteValue` if a compartment is NaN or Inf
    /// - `ConservationViolation` if drift exceeds the tolerance
    pub fn check(&mut self, state: &SimulationState) -> EpiResult<Severity> {
        let day = state.current_day();

        if self.config.check_finite {
            Self::check_finite(state, day)?;
        }

        self.check_negative(state, day);

        let expected = state.total_population();
        let total = state.population_sum();
        let drift = total - expected;

        match self.config.classify(drift) {
            Severity::Fatal | Severity::Critical => Err(EpiError::ConservationViolation {
                day,
                total,
                expected,
                tolerance: self.config.tolerance,
            }),
            Severity::Warning => {
                if !self.warned_drift {
                    debug!(
                        day,
                        drift,
                        tolerance = self.config.tolerance,
                        "population drift approaching tolerance"
                    );
                    self.warned_drift = true;
                }
                Ok(Severity::Warning)
            }
            Severity::Acceptable => Ok(Severity::Acceptable),
        }
    }

    fn check_finite(state: &SimulationState, day: u32) -> EpiResult<()> {
        for (compartment, value) in state.compartments() {
            if !value.is_finite() {
                return Err(EpiError::NonFiniteValue { day, compartment });
            }
        }
        Ok(())
    }

    fn check_negative(&mut self, state: &SimulationState, day: u32) {
        if self.warned_negative {
            return;
        }
        let negative = state.compartments().into_iter().find(|(_, v)| *v < 0.0);
        if let Some((compartment, value)) = negative {
            warn!(day, compartment, value, "compartment went negative");
            self.warned_negative = true;
        }
    }

    /// Get current configuration.
    #[must_use]
    pub const fn config(&self) -> &GuardConfig {
        &self.config
    }
}
