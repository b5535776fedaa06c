//! Error types
//!
//! `ConfigError` and `GenerationError` reach callers. `Recoverable` never
//! does: generation steps return it to signal a skip or a fallback, and the
//! caller of the step logs it and carries on with a partial record.

use std::fmt;
use thiserror::Error;

use crate::provider::Category;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field}: lower bound {min} exceeds upper bound {max}")]
    InvertedRange { field: String, min: u32, max: u32 },

    #[error("{field}: distribution has no positive weight")]
    EmptyDistribution { field: String },

    #[error("{field}: weight {weight} for '{label}' is negative or not finite")]
    InvalidWeight {
        field: String,
        label: String,
        weight: f64,
    },

    #[error("{field}: probability {value} is outside 0..=100")]
    InvalidProbability { field: String, value: f64 },

    #[error("line {line}: expected key=value, got '{text}'")]
    Malformed { line: usize, text: String },

    #[error("{key}: cannot parse '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("fertility window {fertility_min}-{fertility_max} does not overlap the parent age gap {gap_min}-{gap_max}")]
    FertilityOutsideParentGap {
        fertility_min: u32,
        fertility_max: u32,
        gap_min: u32,
        gap_max: u32,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("invalid rule set: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no consistent record after {attempts} attempts: {detail}")]
    Inconsistent { attempts: usize, detail: String },
}

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Local failure inside one generation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Recoverable {
    /// No value satisfies the constraint within the retry budget.
    ConstraintUnsatisfiable {
        what: &'static str,
        low: i64,
        high: i64,
    },
    /// The provider returned nothing for the category.
    DataUnavailable(Category),
}

impl Recoverable {
    pub fn unsatisfiable(what: &'static str, low: impl Into<i64>, high: impl Into<i64>) -> Self {
        Recoverable::ConstraintUnsatisfiable {
            what,
            low: low.into(),
            high: high.into(),
        }
    }
}

impl fmt::Display for Recoverable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recoverable::ConstraintUnsatisfiable { what, low, high } => {
                write!(f, "no admissible {} in [{}, {}]", what, low, high)
            }
            Recoverable::DataUnavailable(category) => {
                write!(f, "no data for {:?}", category)
            }
        }
    }
}
