//! Engine configuration

use alerting::AlertConfig;
use landmarks::ValidationConfig;
use posture::PostureConfig;
use presence::PresenceConfig;
use serde::{Deserialize, Serialize};

/// Everything the decision engine needs, one section per stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub validation: ValidationConfig,
    pub presence: PresenceConfig,
    pub posture: PostureConfig,
    pub alerts: AlertConfig,
}

impl MonitorConfig {
    /// Tighter posture thresholds
    pub fn strict() -> Self {
        Self {
            posture: PostureConfig::strict(),
            ..Default::default()
        }
    }

    /// Looser posture thresholds
    pub fn lenient() -> Self {
        Self {
            posture: PostureConfig::lenient(),
            ..Default::default()
        }
    }
}
