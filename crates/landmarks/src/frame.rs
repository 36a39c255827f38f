//! Landmark frame types

use serde::{Deserialize, Serialize};

/// 2D position in detector image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Midpoint between two points
    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Face bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center(&self) -> Point2 {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Face detector output for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceEvidence {
    /// Face bounding box, if the detector reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Head pitch (up/down) in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_euler_x: Option<f32>,
    /// Head yaw (left/right) in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_euler_y: Option<f32>,
    /// Head roll (side tilt) in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_euler_z: Option<f32>,

    /// Left eye open probability (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_eye_open: Option<f32>,
    /// Right eye open probability (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_eye_open: Option<f32>,

    /// Identifier that stays stable while the detector keeps tracking the same face
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<i32>,
}

impl FaceEvidence {
    /// Mean of the available eye-open probabilities
    pub fn eye_openness(&self) -> Option<f32> {
        match (self.left_eye_open, self.right_eye_open) {
            (Some(l), Some(r)) => Some((l + r) / 2.0),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }

    /// Pitch, yaw, and roll, when the detector reported all three
    pub fn euler_angles(&self) -> Option<(f32, f32, f32)> {
        Some((self.head_euler_x?, self.head_euler_y?, self.head_euler_z?))
    }

    /// Largest of |pitch| and |yaw|; unreported axes count as facing forward
    pub fn max_rotation(&self) -> f32 {
        let pitch = self.head_euler_x.unwrap_or(0.0);
        let yaw = self.head_euler_y.unwrap_or(0.0);
        pitch.abs().max(yaw.abs())
    }
}

/// Body landmark names (33-point pose model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkKind {
    /// Head, shoulders and elbows
    pub fn is_upper_body(&self) -> bool {
        *self <= LandmarkKind::RightElbow
    }

    pub fn name(&self) -> &'static str {
        match self {
            LandmarkKind::Nose => "nose",
            LandmarkKind::LeftEyeInner => "left_eye_inner",
            LandmarkKind::LeftEye => "left_eye",
            LandmarkKind::LeftEyeOuter => "left_eye_outer",
            LandmarkKind::RightEyeInner => "right_eye_inner",
            LandmarkKind::RightEye => "right_eye",
            LandmarkKind::RightEyeOuter => "right_eye_outer",
            LandmarkKind::LeftEar => "left_ear",
            LandmarkKind::RightEar => "right_ear",
            LandmarkKind::MouthLeft => "mouth_left",
            LandmarkKind::MouthRight => "mouth_right",
            LandmarkKind::LeftShoulder => "left_shoulder",
            LandmarkKind::RightShoulder => "right_shoulder",
            LandmarkKind::LeftElbow => "left_elbow",
            LandmarkKind::RightElbow => "right_elbow",
            LandmarkKind::LeftWrist => "left_wrist",
            LandmarkKind::RightWrist => "right_wrist",
            LandmarkKind::LeftPinky => "left_pinky",
            LandmarkKind::RightPinky => "right_pinky",
            LandmarkKind::LeftIndex => "left_index",
            LandmarkKind::RightIndex => "right_index",
            LandmarkKind::LeftThumb => "left_thumb",
            LandmarkKind::RightThumb => "right_thumb",
            LandmarkKind::LeftHip => "left_hip",
            LandmarkKind::RightHip => "right_hip",
            LandmarkKind::LeftKnee => "left_knee",
            LandmarkKind::RightKnee => "right_knee",
            LandmarkKind::LeftAnkle => "left_ankle",
            LandmarkKind::RightAnkle => "right_ankle",
            LandmarkKind::LeftHeel => "left_heel",
            LandmarkKind::RightHeel => "right_heel",
            LandmarkKind::LeftFootIndex => "left_foot_index",
            LandmarkKind::RightFootIndex => "right_foot_index",
        }
    }
}

/// A single body landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmark {
    pub kind: LandmarkKind,
    pub position: Point2,
    /// Likelihood that the landmark is inside the image (0-1)
    pub in_frame_likelihood: f32,
}

impl PoseLandmark {
    pub fn new(kind: LandmarkKind, x: f32, y: f32, in_frame_likelihood: f32) -> Self {
        Self {
            kind,
            position: Point2::new(x, y),
            in_frame_likelihood,
        }
    }
}

/// Pose detector output for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseEvidence {
    pub landmarks: Vec<PoseLandmark>,
}

impl PoseEvidence {
    pub fn new(landmarks: Vec<PoseLandmark>) -> Self {
        Self { landmarks }
    }

    /// Look up a landmark by name
    pub fn get(&self, kind: LandmarkKind) -> Option<&PoseLandmark> {
        self.landmarks.iter().find(|l| l.kind == kind)
    }

    /// Position of a landmark whose likelihood reaches `min_likelihood`
    pub fn visible_position(&self, kind: LandmarkKind, min_likelihood: f32) -> Option<Point2> {
        self.get(kind)
            .filter(|l| l.in_frame_likelihood >= min_likelihood)
            .map(|l| l.position)
    }

    /// Number of landmarks whose likelihood reaches `min_likelihood`
    pub fn visible_count(&self, min_likelihood: f32) -> usize {
        self.landmarks
            .iter()
            .filter(|l| l.in_frame_likelihood >= min_likelihood)
            .count()
    }

    /// Mean position of the visible upper-body landmarks
    pub fn upper_body_centroid(&self, min_likelihood: f32) -> Option<Point2> {
        let (sum, count) = self
            .landmarks
            .iter()
            .filter(|l| l.kind.is_upper_body() && l.in_frame_likelihood >= min_likelihood)
            .fold((Point2::default(), 0usize), |(acc, n), l| {
                (Point2::new(acc.x + l.position.x, acc.y + l.position.y), n + 1)
            });

        if count == 0 {
            None
        } else {
            Some(Point2::new(sum.x / count as f32, sum.y / count as f32))
        }
    }
}

/// Everything the detectors reported for one camera frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monotonic timestamp (milliseconds)
    #[serde(default)]
    pub timestamp_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceEvidence>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseEvidence>,
}

impl LandmarkFrame {
    /// Frame with no detector evidence at all
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            face: None,
            pose: None,
        }
    }

    pub fn with_face(mut self, face: FaceEvidence) -> Self {
        self.face = Some(face);
        self
    }

    pub fn with_pose(mut self, pose: PoseEvidence) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn has_evidence(&self) -> bool {
        self.face.is_some() || self.pose.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_openness_average() {
        let face = FaceEvidence {
            left_eye_open: Some(0.8),
            right_eye_open: Some(0.4),
            ..Default::default()
        };
        assert!((face.eye_openness().unwrap() - 0.6).abs() < 1e-6);

        let one_eye = FaceEvidence {
            right_eye_open: Some(0.3),
            ..Default::default()
        };
        assert_eq!(one_eye.eye_openness(), Some(0.3));
        assert_eq!(FaceEvidence::default().eye_openness(), None);
    }

    #[test]
    fn test_upper_body_centroid_ignores_hips_and_hidden() {
        let pose = PoseEvidence::new(vec![
            PoseLandmark::new(LandmarkKind::LeftShoulder, 0.0, 0.0, 0.9),
            PoseLandmark::new(LandmarkKind::RightShoulder, 10.0, 0.0, 0.9),
            PoseLandmark::new(LandmarkKind::LeftHip, 100.0, 100.0, 0.9),
            PoseLandmark::new(LandmarkKind::Nose, 500.0, 500.0, 0.1),
        ]);

        let c = pose.upper_body_centroid(0.5).unwrap();
        assert_eq!(c, Point2::new(5.0, 0.0));
        assert_eq!(pose.visible_count(0.5), 3);
    }

    #[test]
    fn test_frame_from_json() {
        let json = r#"{
            "timestamp_ms": 42,
            "face": {"head_euler_x": 3.0, "left_eye_open": 0.9, "tracking_id": 7},
            "pose": {"landmarks": [
                {"kind": "nose", "position": {"x": 1.0, "y": 2.0}, "in_frame_likelihood": 0.99}
            ]}
        }"#;

        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp_ms, 42);
        let face = frame.face.as_ref().unwrap();
        assert_eq!(face.tracking_id, Some(7));
        assert_eq!(face.head_euler_x, Some(3.0));
        assert_eq!(face.head_euler_y, None);
        assert_eq!(face.euler_angles(), None);
        let pose = frame.pose.unwrap();
        assert_eq!(pose.get(LandmarkKind::Nose).unwrap().position, Point2::new(1.0, 2.0));
    }

    #[test]
    fn test_empty_frame_has_no_evidence() {
        assert!(!LandmarkFrame::empty(0).has_evidence());
        assert!(LandmarkFrame::empty(0)
            .with_pose(PoseEvidence::default())
            .has_evidence());
    }
}
