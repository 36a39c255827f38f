//! Posture configuration

use serde::{Deserialize, Serialize};

/// Posture thresholds, relative to the calibration baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Head pitch deviation that counts as forward/backward tilt (degrees)
    pub head_pitch_degrees: f32,

    /// Head yaw deviation that counts as side tilt (degrees)
    pub head_yaw_degrees: f32,

    /// Head roll deviation that counts as roll tilt (degrees)
    pub head_roll_degrees: f32,

    /// Shoulder line deviation that counts as shoulder tilt (degrees)
    pub shoulder_degrees: f32,

    /// Eye openness below this is drowsy, independent of the baseline
    pub drowsy_openness: f32,

    /// Minimum in-frame likelihood for landmarks used in geometry
    pub visibility_threshold: f32,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            head_pitch_degrees: 15.0,
            head_yaw_degrees: 10.0,
            head_roll_degrees: 10.0,
            shoulder_degrees: 8.0,
            drowsy_openness: 0.3,
            visibility_threshold: 0.5,
        }
    }
}

impl PostureConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            head_pitch_degrees: 10.0,
            head_yaw_degrees: 7.0,
            head_roll_degrees: 7.0,
            shoulder_degrees: 5.0,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            head_pitch_degrees: 25.0,
            head_yaw_degrees: 18.0,
            head_roll_degrees: 15.0,
            shoulder_degrees: 12.0,
            drowsy_openness: 0.2,
            ..Default::default()
        }
    }
}
