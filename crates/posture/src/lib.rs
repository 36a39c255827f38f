//! Posture Evaluation
//!
//! Turns landmark frames into posture problem signals:
//! - Head pitch / yaw / roll and shoulder tilt extraction
//! - Eye openness for drowsiness
//! - Calibration baseline and per-axis deviation thresholds

pub mod angles;
pub mod config;
pub mod evaluator;

pub use angles::{AngleExtractor, Angles};
pub use config::PostureConfig;
pub use evaluator::{PostureEvaluator, PostureReading, PostureSignals};

use thiserror::Error;

/// Posture error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostureError {
    #[error("No pose evidence in frame")]
    NoPose,

    #[error("Landmark not visible: {0}")]
    MissingLandmark(&'static str),

    #[error("Degenerate landmark geometry: {0}")]
    DegenerateGeometry(&'static str),
}
