//! Head, shoulder, and eye angle extraction

use crate::PostureError;
use landmarks::{LandmarkFrame, LandmarkKind, Point2, PoseEvidence};
use serde::{Deserialize, Serialize};

/// Posture angles for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Angles {
    /// Head pitch in degrees (positive = looking up)
    pub head_x: f32,
    /// Head yaw in degrees
    pub head_y: f32,
    /// Head roll in degrees
    pub head_z: f32,
    /// Shoulder line tilt in degrees (0 = level)
    pub shoulder_angle: f32,
    /// Eye openness (0 = closed, 1 = fully open)
    pub eye_openness: f32,
}

impl Angles {
    /// Zero angles with fully open eyes
    pub fn neutral() -> Self {
        Self {
            head_x: 0.0,
            head_y: 0.0,
            head_z: 0.0,
            shoulder_angle: 0.0,
            eye_openness: 1.0,
        }
    }

    /// Signed per-axis difference `self - baseline`
    pub fn deviation_from(&self, baseline: &Angles) -> Angles {
        Angles {
            head_x: self.head_x - baseline.head_x,
            head_y: self.head_y - baseline.head_y,
            head_z: self.head_z - baseline.head_z,
            shoulder_angle: self.shoulder_angle - baseline.shoulder_angle,
            eye_openness: self.eye_openness,
        }
    }
}

impl Default for Angles {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Derives [`Angles`] from a landmark frame
#[derive(Debug, Clone)]
pub struct AngleExtractor {
    visibility_threshold: f32,
}

impl AngleExtractor {
    pub fn new(visibility_threshold: f32) -> Self {
        Self {
            visibility_threshold,
        }
    }

    /// Compute angles. Needs both shoulders, plus either the face detector's
    /// Euler angles or enough head landmarks for the geometric estimate.
    pub fn extract(&self, frame: &LandmarkFrame) -> Result<Angles, PostureError> {
        let pose = frame.pose.as_ref().ok_or(PostureError::NoPose)?;

        let left = self.visible(pose, LandmarkKind::LeftShoulder)?;
        let right = self.visible(pose, LandmarkKind::RightShoulder)?;
        let shoulder_angle = line_angle(&right, &left);

        let (head_x, head_y, head_z) = match frame.face.as_ref().and_then(|f| f.euler_angles()) {
            Some(euler) => euler,
            None => self.head_from_geometry(pose)?,
        };

        let eye_openness = frame
            .face
            .as_ref()
            .and_then(|f| f.eye_openness())
            .unwrap_or(1.0);

        Ok(Angles {
            head_x,
            head_y,
            head_z,
            shoulder_angle,
            eye_openness,
        })
    }

    /// Pitch from nose height against the ear (or eye) line, yaw from the
    /// nose offset between the eyes, roll from the eye line.
    fn head_from_geometry(&self, pose: &PoseEvidence) -> Result<(f32, f32, f32), PostureError> {
        let nose = self.visible(pose, LandmarkKind::Nose)?;
        let left_eye = self.visible(pose, LandmarkKind::LeftEye)?;
        let right_eye = self.visible(pose, LandmarkKind::RightEye)?;

        let eye_mid = left_eye.midpoint(&right_eye);
        let eye_distance = left_eye.distance(&right_eye);
        if eye_distance <= f32::EPSILON {
            return Err(PostureError::DegenerateGeometry("eyes"));
        }

        let reference = match (
            pose.visible_position(LandmarkKind::LeftEar, self.visibility_threshold),
            pose.visible_position(LandmarkKind::RightEar, self.visibility_threshold),
        ) {
            (Some(l), Some(r)) => l.midpoint(&r),
            _ => eye_mid,
        };

        // Image y grows downwards: a nose above the reference line means looking up
        let pitch = (reference.y - nose.y).atan2(eye_distance).to_degrees();
        let yaw = (nose.x - eye_mid.x).atan2(eye_distance).to_degrees();
        let roll = line_angle(&right_eye, &left_eye);

        Ok((pitch, yaw, roll))
    }

    fn visible(&self, pose: &PoseEvidence, kind: LandmarkKind) -> Result<Point2, PostureError> {
        pose.visible_position(kind, self.visibility_threshold)
            .ok_or(PostureError::MissingLandmark(kind.name()))
    }
}

/// Tilt of the line through two points, in (-90, 90] degrees
fn line_angle(a: &Point2, b: &Point2) -> f32 {
    let (mut dx, mut dy) = (b.x - a.x, b.y - a.y);
    if dx < 0.0 {
        dx = -dx;
        dy = -dy;
    }
    dy.atan2(dx).to_degrees()
}
