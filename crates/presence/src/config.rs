//! Presence configuration

use serde::{Deserialize, Serialize};

/// Presence detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Minimum in-frame likelihood for a pose landmark to count as visible
    pub visibility_threshold: f32,

    /// Displacement threshold for motion scoring (position units)
    pub motion_threshold: f32,

    /// Number of positions kept by the motion tracker
    pub motion_history: usize,

    /// Frames further apart than this are penalized as stale (milliseconds)
    pub stale_frame_ms: u64,

    /// Negative frames used to learn the environmental noise floor
    pub noise_learning_frames: u32,

    /// Negative scores below `noise_margin * floor` are halved once learned
    pub noise_margin: f32,

    /// Confidence is clamped to [-limit, limit]
    pub confidence_limit: f32,

    /// Continuous absence required before entering user-away (milliseconds)
    pub away_after_ms: u64,

    /// Consecutive absent frames that satisfy the user-away count condition
    pub away_min_frames: u32,

    /// Confidence at or below which the user-away count condition is waived
    pub away_confidence: f32,

    /// Confidence above which a person is present regardless of evidence
    pub present_confidence: f32,

    /// Confidence below which a person is absent regardless of evidence
    pub absent_confidence: f32,

    /// Visible pose landmarks that count as moderate evidence
    pub moderate_landmarks: usize,

    /// Consecutive present frames required to leave user-away
    pub return_min_frames: u32,

    /// Minimum `present_frames * confidence / 5` to leave user-away
    pub return_confidence: f32,

    /// A presence gap shorter than this also allows leaving user-away (milliseconds)
    pub return_gap_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
            motion_threshold: 15.0,
            motion_history: 5,
            stale_frame_ms: 500,
            noise_learning_frames: 30,
            noise_margin: 1.5,
            confidence_limit: 10.0,
            away_after_ms: 3000,
            away_min_frames: 10,
            away_confidence: -3.0,
            present_confidence: 3.0,
            absent_confidence: -5.0,
            moderate_landmarks: 5,
            return_min_frames: 2,
            return_confidence: 1.0,
            return_gap_ms: 800,
        }
    }
}
