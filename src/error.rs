//! Error types for outbreak.
//!
//! Every fallible operation returns `Result<T, EpiError>` instead of
//! panicking. Configuration problems are caught before day 1 runs;
//! conservation and finiteness violations halt the affected scenario.

use thiserror::Error;

/// Result type alias for outbreak operations.
pub type EpiResult<T> = Result<T, EpiError>;

/// Unified error type for all outbreak operations.
#[derive(Debug, Error)]
pub enum EpiError {
    // ===== Input Errors =====
    /// A configuration parameter is outside its documented domain.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the offending parameter.
        message: String,
    },

    // ===== Guard Violations =====
    /// Population sum drifted from the constant total.
    #[error(
        "Conservation violated on day {day}: population {total:.3} != {expected:.3} (tolerance: {tolerance})"
    )]
    ConservationViolation {
        /// Day on which the drift was detected.
        day: u32,
        /// Sum of all compartments.
        total: f64,
        /// Closed-population size.
        expected: f64,
        /// Allowed absolute drift.
        tolerance: f64,
    },

    /// A compartment became NaN or infinite.
    #[error("Non-finite value in {compartment} on day {day}")]
    NonFiniteValue {
        /// Day on which the value was detected.
        day: u32,
        /// Compartment name.
        compartment: &'static str,
    },

    // ===== Shell Errors =====
    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EpiError {
    /// Create an invalid-configuration error with a message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error indicates a defect in the recurrence (run must abort).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConservationViolation { .. } | Self::NonFiniteValue { .. }
        )
    }

    /// Check if this error is an invalid-configuration error.
    #[must_use]
    pub const fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

impl From<validator::ValidationErrors> for EpiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::invalid(errors.to_string())
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_detection() {
        let drift = EpiError::ConservationViolation {
            day: 12,
            total: 1002.5,
            expected: 1000.0,
            tolerance: 1.0,
        };
        assert!(drift.is_fatal());

        let nan = EpiError::NonFiniteValue {
            day: 3,
            compartment: "infectious",
        };
        assert!(nan.is_fatal());

        let config = EpiError::invalid("death_rate out of range");
        assert!(!config.is_fatal());
        assert!(config.is_invalid_configuration());
    }

    #[test]
    fn test_conservation_display() {
        let err = EpiError::ConservationViolation {
            day: 40,
            total: 1003.25,
            expected: 1000.0,
            tolerance: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("day 40"));
        assert!(msg.contains("1003.250"));
        assert!(msg.contains("1000.000"));
    }

    #[test]
    fn test_invalid_display() {
        let err = EpiError::invalid("total_population must be positive");
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("total_population"));
    }

    #[test]
    fn test_non_finite_display() {
        let err = EpiError::NonFiniteValue {
            day: 7,
            compartment: "susceptible",
        };
        let msg = err.to_string();
        assert!(msg.contains("susceptible"));
        assert!(msg.contains("day 7"));
    }

    #[test]
    fn test_io_error() {
        let err = EpiError::from(std::io::Error::other("missing study"));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_serialization_error() {
        let err = EpiError::serialization("bad json");
        assert!(!err.is_invalid_configuration());
        assert!(err.to_string().contains("Serialization error"));
    }
}
