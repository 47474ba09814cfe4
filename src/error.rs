//! Error taxonomy for the grade-computation and statistics engine.
//!
//! Absent data is never an error; these variants only cover values that
//! violate their domain or requests that cannot be answered.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A present value violates its declared domain (e.g. a score outside 0-100).
    #[error("validation error: {0}")]
    Validation(String),

    /// A statistic was requested over zero present values.
    #[error("no present values for field '{0}'")]
    EmptyDataset(String),

    #[error("percentile must be within [0, 100], got {0}")]
    InvalidPercentile(f64),
}

pub type Result<T> = std::result::Result<T, EngineError>;
