//! Alert configuration

use crate::issue::IssueType;
use serde::{Deserialize, Serialize};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Debounce for the four head tilt issues (milliseconds)
    pub head_tilt_debounce_ms: u64,
    /// Debounce for shoulder tilt (milliseconds)
    pub shoulder_debounce_ms: u64,
    /// Debounce for drowsiness (milliseconds)
    pub drowsiness_debounce_ms: u64,
    /// Debounce for user away (milliseconds)
    pub away_debounce_ms: u64,
    /// Continuous absence that escalates the away alert to levels 1, 3, and 5 (milliseconds)
    pub away_levels_ms: [u64; 3],
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            head_tilt_debounce_ms: 1500,
            shoulder_debounce_ms: 2000,
            drowsiness_debounce_ms: 2500,
            away_debounce_ms: 3000,
            away_levels_ms: [30_000, 120_000, 300_000],
        }
    }
}

impl AlertConfig {
    /// Debounce duration for an issue type
    pub fn debounce_ms(&self, issue: IssueType) -> u64 {
        match issue {
            IssueType::HeadForwardTilt
            | IssueType::HeadBackwardTilt
            | IssueType::HeadSideTilt
            | IssueType::HeadRollTilt => self.head_tilt_debounce_ms,
            IssueType::ShoulderTilt => self.shoulder_debounce_ms,
            IssueType::Drowsiness => self.drowsiness_debounce_ms,
            IssueType::UserAway => self.away_debounce_ms,
        }
    }
}
