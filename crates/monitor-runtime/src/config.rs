//! Runtime timing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timers and queue sizes for the task set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Away escalation check period while absent (milliseconds)
    pub away_check_ms: u64,
    /// Keepalive period while connected (milliseconds)
    pub keepalive_ms: u64,
    /// Feed an empty frame when the detector has been silent this long (milliseconds)
    pub idle_frame_after_ms: u64,
    /// Frames that may wait while one is being evaluated
    pub frame_queue: usize,
    /// Commands that may wait for the transport
    pub command_queue: usize,
    /// Event broadcast buffer per subscriber
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            away_check_ms: 10_000,
            keepalive_ms: 30_000,
            idle_frame_after_ms: 1000,
            frame_queue: 1,
            command_queue: 64,
            event_capacity: 256,
        }
    }
}

impl RuntimeConfig {
    pub fn away_check(&self) -> Duration {
        Duration::from_millis(self.away_check_ms.max(1))
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms.max(1))
    }

    pub fn idle_frame_after(&self) -> Duration {
        Duration::from_millis(self.idle_frame_after_ms.max(1))
    }
}
