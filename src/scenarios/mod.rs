//! Named outbreak scenarios.
//!
//! A [`Scenario`] pairs a [`ScenarioConfig`] with a label and a display
//! style that are passed through to plotters untouched. Ready-made presets
//! cover the social-behaviour comparisons the model was built for:
//! - Normal life (R0 = 2.5)
//! - Mild social distancing (R0 = 1.25)
//! - Strong social distancing (R0 = 1.1)
//! - Distancing until the infection is gone, then normal life

pub mod orchestrator;

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;

pub use orchestrator::{
    align, summarize, AlignedSeries, Comparison, PeakInfectious, ScenarioResult, ScenarioRunner,
    ScenarioSummary,
};

/// R0 without any social distancing.
pub const NORMAL_LIFE_R0: f64 = 2.5;
/// R0 under mild social distancing.
pub const MILD_DISTANCING_R0: f64 = 1.25;
/// R0 under strong social distancing.
pub const STRONG_DISTANCING_R0: f64 = 1.1;

/// Line style hint for plotters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStyle {
    /// Continuous line.
    #[default]
    Solid,
    /// Dotted line.
    Dotted,
    /// Dashed line.
    Dashed,
    /// Alternating dashes and dots.
    DashDot,
}

impl std::fmt::Display for LineStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Solid => "solid",
            Self::Dotted => "dotted",
            Self::Dashed => "dashed",
            Self::DashDot => "dash-dot",
        };
        f.write_str(name)
    }
}

/// A labelled scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Caller-supplied name.
    pub label: String,
    /// Display hint.
    #[serde(default)]
    pub line_style: LineStyle,
    /// Model parameters.
    #[serde(default)]
    pub config: ScenarioConfig,
}

impl Scenario {
    /// Create a scenario.
    #[must_use]
    pub fn new(label: impl Into<String>, line_style: LineStyle, config: ScenarioConfig) -> Self {
        Self {
            label: label.into(),
            line_style,
            config,
        }
    }

    /// Constant R0 for the whole run.
    #[must_use]
    pub fn constant(label: impl Into<String>, line_style: LineStyle, r0: f64) -> Self {
        let config = ScenarioConfig {
            initial_reproduction_number: r0,
            relaxed_reproduction_number: r0,
            immunity_duration_days: 0,
            ..ScenarioConfig::default()
        };
        Self::new(label, line_style, config)
    }

    /// No social distancing.
    #[must_use]
    pub fn normal_life() -> Self {
        Self::constant("Normal Life", LineStyle::Dotted, NORMAL_LIFE_R0)
    }

    /// Mild social distancing for the whole run.
    #[must_use]
    pub fn mild_social_distancing() -> Self {
        Self::constant("Mild Social Distancing", LineStyle::Solid, MILD_DISTANCING_R0)
    }

    /// Strong social distancing for the whole run.
    #[must_use]
    pub fn strong_social_distancing() -> Self {
        Self::constant(
            "Strong Social Distancing",
            LineStyle::Dashed,
            STRONG_DISTANCING_R0,
        )
    }

    /// Mild distancing until the infection is gone, then normal life.
    #[must_use]
    pub fn distancing_until_gone() -> Self {
        let config = ScenarioConfig {
            initial_reproduction_number: MILD_DISTANCING_R0,
            relaxed_reproduction_number: NORMAL_LIFE_R0,
            relax_on_extinction: true,
            ..ScenarioConfig::default()
        };
        Self::new(
            format!("R0 = {MILD_DISTANCING_R0}, then {NORMAL_LIFE_R0}"),
            LineStyle::DashDot,
            config,
        )
    }

    /// Mild distancing that ends on `cutoff_day` regardless of the outbreak.
    #[must_use]
    pub fn distancing_until_day(cutoff_day: u32) -> Self {
        let config = ScenarioConfig {
            initial_reproduction_number: MILD_DISTANCING_R0,
            relaxed_reproduction_number: NORMAL_LIFE_R0,
            social_distancing_cutoff_day: Some(cutoff_day),
            ..ScenarioConfig::default()
        };
        Self::new(
            format!("Distancing until day {cutoff_day}"),
            LineStyle::Dashed,
            config,
        )
    }
}

/// Normal life against mild and strong distancing.
#[must_use]
pub fn reference_comparison() -> Vec<Scenario> {
    vec![
        Scenario::normal_life(),
        Scenario::mild_social_distancing(),
        Scenario::strong_social_distancing(),
    ]
}
