//! Baseline-relative posture evaluation

use crate::angles::{AngleExtractor, Angles};
use crate::config::PostureConfig;
use landmarks::LandmarkFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Raw (not debounced) posture problem signals for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureSignals {
    pub head_forward: bool,
    pub head_backward: bool,
    pub head_side: bool,
    pub head_roll: bool,
    pub shoulder_tilt: bool,
    pub drowsy: bool,
}

impl PostureSignals {
    pub fn any(&self) -> bool {
        self.head_forward
            || self.head_backward
            || self.head_side
            || self.head_roll
            || self.shoulder_tilt
            || self.drowsy
    }
}

/// Evaluation result for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureReading {
    /// Angles measured this frame
    pub angles: Angles,
    /// Signed deviation from the baseline
    pub deviation: Angles,
    pub signals: PostureSignals,
    /// This frame became the calibration baseline
    pub calibrated: bool,
}

/// Compares each frame's angles against a calibration baseline
#[derive(Debug, Clone)]
pub struct PostureEvaluator {
    config: PostureConfig,
    extractor: AngleExtractor,
    baseline: Option<Angles>,
}

impl PostureEvaluator {
    pub fn new(config: PostureConfig) -> Self {
        Self {
            extractor: AngleExtractor::new(config.visibility_threshold),
            config,
            baseline: None,
        }
    }

    /// Evaluate a frame in which a person is present.
    ///
    /// Returns `None` when the frame lacks face or pose evidence, or its
    /// angles cannot be computed. Such a frame says nothing about posture
    /// and leaves the baseline untouched.
    pub fn evaluate(&mut self, frame: &LandmarkFrame) -> Option<PostureReading> {
        if frame.face.is_none() || frame.pose.is_none() {
            return None;
        }

        let angles = match self.extractor.extract(frame) {
            Ok(angles) => angles,
            Err(e) => {
                debug!("Angle extraction failed: {}", e);
                return None;
            }
        };

        let calibrated = self.baseline.is_none();
        let baseline = *self.baseline.get_or_insert(angles);
        if calibrated {
            info!(
                "Calibrated posture baseline: head ({:.1}, {:.1}, {:.1}), shoulders {:.1}",
                angles.head_x, angles.head_y, angles.head_z, angles.shoulder_angle
            );
        }

        let deviation = angles.deviation_from(&baseline);
        let signals = self.signals(&angles, &deviation);

        Some(PostureReading {
            angles,
            deviation,
            signals,
            calibrated,
        })
    }

    /// Current baseline, or zero angles when not yet calibrated
    pub fn baseline(&self) -> Angles {
        self.baseline.unwrap_or_default()
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// Forget the baseline; the next good reading becomes the new one
    pub fn recalibrate(&mut self) {
        self.baseline = None;
    }

    fn signals(&self, angles: &Angles, deviation: &Angles) -> PostureSignals {
        let c = &self.config;
        PostureSignals {
            head_forward: deviation.head_x < -c.head_pitch_degrees,
            head_backward: deviation.head_x > c.head_pitch_degrees,
            head_side: deviation.head_y.abs() > c.head_yaw_degrees,
            head_roll: deviation.head_z.abs() > c.head_roll_degrees,
            shoulder_tilt: deviation.shoulder_angle.abs() > c.shoulder_degrees,
            drowsy: angles.eye_openness < c.drowsy_openness,
        }
    }
}
