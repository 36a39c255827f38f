//! Per-frame presence scoring
//!
//! A weighted additive score rather than a probability: every term can be
//! read off a diagnostic line and traced back to the evidence that caused it.

use crate::config::PresenceConfig;
use landmarks::{FaceEvidence, LandmarkKind, PoseEvidence};
use tracing::debug;

const FACE_PRESENT: f32 = 3.0;
const FACE_ABSENT: f32 = -2.5;
const TRACKING_BONUS: f32 = 0.5;
const POSE_ABSENT: f32 = -1.5;
const KEY_LANDMARKS_ABSENT: f32 = -3.0;
const KEY_LANDMARK_SCALE: f32 = 2.0;
const MOTION_SCALE: f32 = 1.5;
const STALE_PENALTY: f32 = 0.5;
const STALE_MAX_FACTOR: f32 = 3.0;

/// Weighted landmarks for the likelihood term
const KEY_LANDMARKS: [(LandmarkKind, f32); 9] = [
    (LandmarkKind::Nose, 3.0),
    (LandmarkKind::LeftEye, 2.5),
    (LandmarkKind::RightEye, 2.5),
    (LandmarkKind::LeftEar, 1.5),
    (LandmarkKind::RightEar, 1.5),
    (LandmarkKind::LeftShoulder, 2.0),
    (LandmarkKind::RightShoulder, 2.0),
    (LandmarkKind::LeftElbow, 1.0),
    (LandmarkKind::RightElbow, 1.0),
];

/// Stateless presence scorer
#[derive(Debug, Clone)]
pub struct PresenceScorer {
    visibility_threshold: f32,
    stale_frame_ms: u64,
}

impl PresenceScorer {
    pub fn new(config: &PresenceConfig) -> Self {
        Self {
            visibility_threshold: config.visibility_threshold,
            stale_frame_ms: config.stale_frame_ms.max(1),
        }
    }

    /// Score one frame's evidence. Positive means "someone is there".
    pub fn score(
        &self,
        face: Option<&FaceEvidence>,
        pose: Option<&PoseEvidence>,
        motion: f32,
        elapsed_ms: u64,
    ) -> f32 {
        let face_term = face_term(face);
        let pose_term = self.pose_term(pose);
        let motion_term = motion.clamp(0.0, 1.0) * MOTION_SCALE;
        let stale_term = self.stale_term(elapsed_ms);

        let score = face_term + pose_term + motion_term - stale_term;
        debug!(
            "Presence score {:.2} (face {:.2}, pose {:.2}, motion {:.2}, stale -{:.2})",
            score, face_term, pose_term, motion_term, stale_term
        );
        score
    }

    fn pose_term(&self, pose: Option<&PoseEvidence>) -> f32 {
        let Some(pose) = pose else {
            return POSE_ABSENT + KEY_LANDMARKS_ABSENT;
        };

        let count = pose.visible_count(self.visibility_threshold);
        let density = if count >= 15 {
            2.5
        } else if count >= 10 {
            2.0
        } else if count >= 5 {
            1.5
        } else if count > 0 {
            0.5
        } else {
            0.0
        };

        density + key_landmark_likelihood(pose) * KEY_LANDMARK_SCALE
    }

    fn stale_term(&self, elapsed_ms: u64) -> f32 {
        if elapsed_ms <= self.stale_frame_ms {
            return 0.0;
        }
        let factor = (elapsed_ms as f32 / self.stale_frame_ms as f32).min(STALE_MAX_FACTOR);
        STALE_PENALTY * factor
    }
}

fn face_term(face: Option<&FaceEvidence>) -> f32 {
    let Some(face) = face else {
        return FACE_ABSENT;
    };

    let mut term = FACE_PRESENT;

    let rotation = face.max_rotation();
    if rotation > 45.0 {
        term -= 2.0;
    } else if rotation > 30.0 {
        term -= 1.0;
    } else if rotation > 20.0 {
        term -= 0.5;
    }

    if let Some(openness) = face.eye_openness() {
        term += if openness > 0.7 {
            1.0
        } else if openness > 0.4 {
            0.7
        } else if openness > 0.2 {
            0.4
        } else {
            -0.2
        };
    }

    if face.tracking_id.is_some() {
        term += TRACKING_BONUS;
    }

    term
}

/// Weight-normalized mean likelihood of the key landmarks that were reported
fn key_landmark_likelihood(pose: &PoseEvidence) -> f32 {
    let (weighted, weights) = KEY_LANDMARKS
        .iter()
        .filter_map(|(kind, weight)| pose.get(*kind).map(|l| (l.in_frame_likelihood, *weight)))
        .fold((0.0f32, 0.0f32), |(sum, total), (likelihood, weight)| {
            (sum + likelihood * weight, total + weight)
        });

    if weights > 0.0 {
        weighted / weights
    } else {
        0.0
    }
}

/// Learns the magnitude of ambient negative jitter and softens it.
///
/// The first `learning_frames` negative scores are averaged into a floor.
/// Afterwards, negative scores weaker than `margin * floor` are halved.
#[derive(Debug, Clone)]
pub struct NoiseFloor {
    level: f32,
    samples: u32,
    learning_frames: u32,
    margin: f32,
}

impl NoiseFloor {
    pub fn new(learning_frames: u32, margin: f32) -> Self {
        Self {
            level: 0.0,
            samples: 0,
            learning_frames,
            margin,
        }
    }

    /// Feed a raw score, get the score to accumulate
    pub fn adapt(&mut self, score: f32) -> f32 {
        if score >= 0.0 {
            return score;
        }

        let magnitude = score.abs();
        if !self.is_learned() {
            self.samples += 1;
            self.level += (magnitude - self.level) / self.samples as f32;
            return score;
        }

        if magnitude < self.margin * self.level {
            score / 2.0
        } else {
            score
        }
    }

    pub fn is_learned(&self) -> bool {
        self.samples >= self.learning_frames
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
        self.samples = 0;
    }
}
