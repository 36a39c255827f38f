//! Frame Validator for Detector Output

use crate::error::ValidationError;
use crate::frame::{FaceEvidence, LandmarkFrame, PoseEvidence, PoseLandmark};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest head angle magnitude a detector may report (degrees)
    pub max_head_angle: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_head_angle: 180.0,
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

/// Validator for landmark frames
pub struct FrameValidator {
    config: ValidationConfig,
}

impl FrameValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Check a frame without modifying it
    pub fn validate(&self, frame: &LandmarkFrame) -> ValidationResult {
        let mut errors = Vec::new();
        let mut fields_checked = 0;

        if let Some(face) = &frame.face {
            fields_checked += 5;
            self.check_face(face, &mut errors);
        }

        if let Some(pose) = &frame.pose {
            let mut seen = HashSet::new();
            for landmark in &pose.landmarks {
                fields_checked += 2;
                if !landmark.position.is_finite() {
                    errors.push(ValidationError::NonFinite {
                        field: landmark.kind.name(),
                    });
                }
                check_probability(landmark.kind.name(), landmark.in_frame_likelihood, &mut errors);
                if !seen.insert(landmark.kind) {
                    errors.push(ValidationError::DuplicateLandmark(landmark.kind.name()));
                }
            }
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            fields_checked,
        }
    }

    /// Repair a frame so that it always validates.
    ///
    /// Probabilities are clamped to [0, 1], unusable values are dropped.
    /// A face whose head angles are not finite is removed entirely so the
    /// frame degrades to weaker evidence instead of poisoning the angles.
    pub fn sanitize(&self, frame: &LandmarkFrame) -> LandmarkFrame {
        let result = self.validate(frame);
        if result.valid {
            return frame.clone();
        }

        for error in &result.errors {
            warn!("Sanitizing detector frame {}: {}", frame.timestamp_ms, error);
        }

        LandmarkFrame {
            timestamp_ms: frame.timestamp_ms,
            face: frame.face.as_ref().and_then(|f| self.sanitize_face(f)),
            pose: frame.pose.as_ref().map(sanitize_pose),
        }
    }

    fn check_face(&self, face: &FaceEvidence, errors: &mut Vec<ValidationError>) {
        for (field, value) in [
            ("head_euler_x", face.head_euler_x),
            ("head_euler_y", face.head_euler_y),
            ("head_euler_z", face.head_euler_z),
        ] {
            let Some(value) = value else { continue };
            if !value.is_finite() {
                errors.push(ValidationError::NonFinite { field });
            } else if value.abs() > self.config.max_head_angle {
                errors.push(ValidationError::AngleOutOfRange {
                    field,
                    value,
                    limit: self.config.max_head_angle,
                });
            }
        }

        if let Some(v) = face.left_eye_open {
            check_probability("left_eye_open", v, errors);
        }
        if let Some(v) = face.right_eye_open {
            check_probability("right_eye_open", v, errors);
        }

        if let Some(bbox) = &face.bounding_box {
            if ![bbox.x, bbox.y, bbox.width, bbox.height]
                .iter()
                .all(|v| v.is_finite())
            {
                errors.push(ValidationError::NonFinite {
                    field: "bounding_box",
                });
            }
        }
    }

    fn sanitize_face(&self, face: &FaceEvidence) -> Option<FaceEvidence> {
        let angles_finite = [face.head_euler_x, face.head_euler_y, face.head_euler_z]
            .iter()
            .flatten()
            .all(|v| v.is_finite());
        if !angles_finite {
            return None;
        }

        let limit = self.config.max_head_angle;
        let clamp_angle = |v: Option<f32>| v.map(|v| v.clamp(-limit, limit));
        Some(FaceEvidence {
            bounding_box: face.bounding_box.filter(|b| {
                [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite())
            }),
            head_euler_x: clamp_angle(face.head_euler_x),
            head_euler_y: clamp_angle(face.head_euler_y),
            head_euler_z: clamp_angle(face.head_euler_z),
            left_eye_open: face.left_eye_open.and_then(clamp_probability),
            right_eye_open: face.right_eye_open.and_then(clamp_probability),
            tracking_id: face.tracking_id,
        })
    }
}

impl Default for FrameValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

fn check_probability(field: &'static str, value: f32, errors: &mut Vec<ValidationError>) {
    if !value.is_finite() {
        errors.push(ValidationError::NonFinite { field });
    } else if !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::ProbabilityOutOfRange { field, value });
    }
}

fn clamp_probability(value: f32) -> Option<f32> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

fn sanitize_pose(pose: &PoseEvidence) -> PoseEvidence {
    let mut seen = HashSet::new();
    let landmarks = pose
        .landmarks
        .iter()
        .filter(|l| l.position.is_finite())
        .filter_map(|l| {
            clamp_probability(l.in_frame_likelihood).map(|p| PoseLandmark {
                in_frame_likelihood: p,
                ..*l
            })
        })
        .filter(|l| seen.insert(l.kind))
        .collect();
    PoseEvidence { landmarks }
}
