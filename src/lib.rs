//! # outbreak
//!
//! Deterministic compartmental outbreak simulation.
//!
//! A closed, well-mixed population moves through four compartments
//! (susceptible, infectious, immune, dead), one day at a time:
//! - Transmission scales R0 by the remaining susceptible fraction
//! - Infection cohorts stop being infectious after a fixed period
//! - Recovered cohorts may lose immunity after a fixed duration
//! - Social distancing ends on a cutoff day or once the infection is gone
//!
//! Several scenarios can be run side by side and padded to a common length
//! for plotting.
//!
//! ## Example
//!
//! ```rust
//! use outbreak::prelude::*;
//!
//! let config = ScenarioConfig::builder()
//!     .total_population(1_000_000.0)
//!     .initial_infectious(10.0)
//!     .reproduction_number(2.5)
//!     .build()
//!     .unwrap();
//!
//! let mut engine = EpidemicEngine::new(config).unwrap();
//! let state = engine.run().unwrap();
//! assert!(state.is_extinct());
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Keep the recurrence written as the model states it
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod scenarios;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{RunnerConfig, ScenarioConfig, ScenarioConfigBuilder, StudyConfig};
    pub use crate::engine::{
        ConservationGuard, DailyUpdate, DayRecord, EpidemicEngine, GuardConfig, History,
        MilestoneConfig, MilestoneReport, SimulationState,
    };
    pub use crate::error::{EpiError, EpiResult};
    pub use crate::scenarios::{
        align, reference_comparison, summarize, AlignedSeries, Comparison, LineStyle, Scenario,
        ScenarioResult, ScenarioRunner, ScenarioSummary,
    };
}

/// Re-export for public API
pub use error::{EpiError, EpiResult};
