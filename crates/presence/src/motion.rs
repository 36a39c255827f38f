//! Inter-frame motion scoring

use landmarks::{LandmarkFrame, LandmarkKind, Point2};
use std::collections::VecDeque;

/// Tracks a representative body position and scores how much it moves.
///
/// Steady small motion is a strong presence cue: people fidget, empty chairs
/// do not. Large jumps are scored high as well, stillness low.
#[derive(Debug, Clone)]
pub struct MotionTracker {
    history: VecDeque<Point2>,
    capacity: usize,
    threshold: f32,
    visibility_threshold: f32,
}

impl MotionTracker {
    pub fn new(capacity: usize, threshold: f32, visibility_threshold: f32) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
            threshold,
            visibility_threshold,
        }
    }

    /// Record the frame's position and return a motion score in [0, 1]
    pub fn update(&mut self, frame: &LandmarkFrame) -> f32 {
        if let Some(position) = self.representative_position(frame) {
            if self.history.len() >= self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(position);
        }
        self.score()
    }

    /// Current motion score without recording anything
    pub fn score(&self) -> f32 {
        let len = self.history.len();
        if len < 2 {
            return 0.0;
        }

        let distance = self.history[len - 1].distance(&self.history[len - 2]);
        let t = self.threshold;
        let mut score: f32 = if distance > 2.0 * t {
            1.0
        } else if distance > t {
            0.7
        } else if distance > t / 2.0 {
            0.3
        } else {
            0.1
        };

        if len == self.capacity {
            let mean = self.mean_displacement();
            if mean > t / 3.0 && mean < t {
                score += 0.2;
            }
        }

        score.clamp(0.0, 1.0)
    }

    /// Most recent tracked position
    pub fn last_position(&self) -> Option<Point2> {
        self.history.back().copied()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn mean_displacement(&self) -> f32 {
        let steps = self.history.len() - 1;
        let total: f32 = self
            .history
            .iter()
            .zip(self.history.iter().skip(1))
            .map(|(a, b)| a.distance(b))
            .sum();
        total / steps as f32
    }

    fn representative_position(&self, frame: &LandmarkFrame) -> Option<Point2> {
        if let Some(bbox) = frame.face.as_ref().and_then(|f| f.bounding_box) {
            return Some(bbox.center());
        }

        if let Some(pose) = &frame.pose {
            if let Some(nose) = pose.visible_position(LandmarkKind::Nose, self.visibility_threshold) {
                return Some(nose);
            }
            if let Some(centroid) = pose.upper_body_centroid(self.visibility_threshold) {
                return Some(centroid);
            }
        }

        self.last_position()
    }
}
