//! Validation Error Types

use thiserror::Error;

/// Problems found in a landmark frame delivered by a detector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Probability or likelihood outside [0, 1]
    #[error("{field} value {value} is outside [0, 1]")]
    ProbabilityOutOfRange { field: &'static str, value: f32 },

    /// NaN or infinite coordinate / angle
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    /// Angle magnitude beyond what a detector can report
    #[error("{field} angle {value} exceeds limit {limit}")]
    AngleOutOfRange {
        field: &'static str,
        value: f32,
        limit: f32,
    },

    /// Same landmark reported more than once
    #[error("Duplicate landmark: {0}")]
    DuplicateLandmark(&'static str),
}
