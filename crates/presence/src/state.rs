//! Presence state machine

use crate::config::PresenceConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Coarse monitoring state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MonitorState {
    /// Monitoring has not been started
    #[default]
    Idle,
    /// A person is being monitored
    Monitoring,
    /// Nobody has been seen for long enough
    UserAway,
}

/// Per-frame evidence strength used by the presence rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceEvidence {
    pub has_tracking_id: bool,
    pub has_eye_openness: bool,
    pub pose_landmarks: usize,
}

/// A state change, reported once on the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: MonitorState,
    pub to: MonitorState,
    pub at_ms: u64,
}

/// Monitoring / user-away hysteresis
#[derive(Debug, Clone)]
pub struct PresenceStateMachine {
    config: PresenceConfig,
    state: MonitorState,
    /// Timestamp of the first absent frame of the current absence
    absent_since: Option<u64>,
    consecutive_absent: u32,
    present_frames: u32,
    last_present_at: Option<u64>,
}

impl PresenceStateMachine {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            state: MonitorState::Idle,
            absent_since: None,
            consecutive_absent: 0,
            present_frames: 0,
            last_present_at: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Start of the absence currently in progress
    pub fn absent_since(&self) -> Option<u64> {
        self.absent_since
    }

    pub fn consecutive_absent(&self) -> u32 {
        self.consecutive_absent
    }

    /// Enter monitoring from any state, clearing all counters
    pub fn start(&mut self, now_ms: u64) -> Option<StateTransition> {
        let from = self.state;
        self.clear_counters();
        self.last_present_at = None;
        self.state = MonitorState::Monitoring;
        info!("Presence monitoring started");

        (from != MonitorState::Monitoring).then_some(StateTransition {
            from,
            to: MonitorState::Monitoring,
            at_ms: now_ms,
        })
    }

    /// Return to idle
    pub fn stop(&mut self, now_ms: u64) -> Option<StateTransition> {
        let from = self.state;
        self.clear_counters();
        self.last_present_at = None;
        self.state = MonitorState::Idle;

        (from != MonitorState::Idle).then_some(StateTransition {
            from,
            to: MonitorState::Idle,
            at_ms: now_ms,
        })
    }

    /// Decide whether this frame shows a person. First matching rule wins.
    pub fn is_present(&self, evidence: &PresenceEvidence, confidence: f32) -> bool {
        if evidence.has_tracking_id && evidence.has_eye_openness {
            return true;
        }
        if evidence.pose_landmarks >= self.config.moderate_landmarks && confidence > 0.0 {
            return true;
        }
        if confidence > self.config.present_confidence {
            return true;
        }
        if confidence < self.config.absent_confidence {
            return false;
        }
        confidence > 0.0
    }

    /// Advance the machine with this frame's presence decision
    pub fn update(&mut self, present: bool, confidence: f32, now_ms: u64) -> Option<StateTransition> {
        match self.state {
            MonitorState::Idle => None,
            MonitorState::Monitoring => self.update_monitoring(present, confidence, now_ms),
            MonitorState::UserAway => self.update_away(present, confidence, now_ms),
        }
    }

    fn update_monitoring(&mut self, present: bool, confidence: f32, now_ms: u64) -> Option<StateTransition> {
        if present {
            self.absent_since = None;
            self.consecutive_absent = 0;
            self.present_frames = self.present_frames.saturating_add(1);
            self.last_present_at = Some(now_ms);
            return None;
        }

        self.present_frames = 0;
        self.consecutive_absent = self.consecutive_absent.saturating_add(1);
        let since = *self.absent_since.get_or_insert(now_ms);
        let absent_for = now_ms.saturating_sub(since);

        let time_gate = absent_for > self.config.away_after_ms;
        let evidence_gate = self.consecutive_absent >= self.config.away_min_frames
            || confidence <= self.config.away_confidence;

        if time_gate && evidence_gate {
            info!(
                "User away after {}ms ({} absent frames, confidence {:.2})",
                absent_for, self.consecutive_absent, confidence
            );
            self.state = MonitorState::UserAway;
            return Some(StateTransition {
                from: MonitorState::Monitoring,
                to: MonitorState::UserAway,
                at_ms: now_ms,
            });
        }

        debug!(
            "Absent frame {} ({}ms), confidence {:.2}",
            self.consecutive_absent, absent_for, confidence
        );
        None
    }

    fn update_away(&mut self, present: bool, confidence: f32, now_ms: u64) -> Option<StateTransition> {
        if !present {
            self.present_frames = 0;
            self.consecutive_absent = self.consecutive_absent.saturating_add(1);
            return None;
        }

        self.present_frames = self.present_frames.saturating_add(1);
        let gap = self.last_present_at.map(|t| now_ms.saturating_sub(t));
        self.last_present_at = Some(now_ms);

        let return_confidence = self.present_frames as f32 * confidence / 5.0;
        let quick_return = gap.is_some_and(|g| g < self.config.return_gap_ms);

        if self.present_frames >= self.config.return_min_frames
            && (return_confidence >= self.config.return_confidence || quick_return)
        {
            info!(
                "User returned ({} present frames, return confidence {:.2})",
                self.present_frames, return_confidence
            );
            self.clear_counters();
            self.state = MonitorState::Monitoring;
            return Some(StateTransition {
                from: MonitorState::UserAway,
                to: MonitorState::Monitoring,
                at_ms: now_ms,
            });
        }

        None
    }

    fn clear_counters(&mut self) {
        self.absent_since = None;
        self.consecutive_absent = 0;
        self.present_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> PresenceStateMachine {
        let mut sm = PresenceStateMachine::new(PresenceConfig::default());
        sm.start(0);
        sm
    }

    /// Drive the machine into user-away, returning the next free timestamp
    fn go_away(sm: &mut PresenceStateMachine) -> u64 {
        let mut t = 0;
        while sm.state() != MonitorState::UserAway {
            t += 100;
            sm.update(false, -8.0, t);
        }
        t
    }

    #[test]
    fn test_presence_rules_precedence() {
        let sm = started();
        let strong = PresenceEvidence {
            has_tracking_id: true,
            has_eye_openness: true,
            pose_landmarks: 0,
        };
        assert!(sm.is_present(&strong, -9.0));

        let moderate = PresenceEvidence {
            pose_landmarks: 6,
            ..Default::default()
        };
        assert!(sm.is_present(&moderate, 0.1));
        assert!(!sm.is_present(&moderate, 0.0));

        let none = PresenceEvidence::default();
        assert!(sm.is_present(&none, 3.5));
        assert!(!sm.is_present(&none, -6.0));
        assert!(sm.is_present(&none, 0.5));
        assert!(!sm.is_present(&none, -0.5));
    }

    #[test]
    fn test_idle_ignores_frames() {
        let mut sm = PresenceStateMachine::new(PresenceConfig::default());
        assert_eq!(sm.update(false, -10.0, 10_000), None);
        assert_eq!(sm.state(), MonitorState::Idle);
    }

    #[test]
    fn test_away_not_before_time_gate() {
        let mut sm = started();
        for i in 0..=35 {
            let t = 1000 + i * 100;
            let transition = sm.update(false, -9.5, t);
            // first absent frame at 1000, gate is strictly after 4000
            if t <= 4000 {
                assert!(transition.is_none(), "transitioned early at {}", t);
            }
        }
        assert_eq!(sm.state(), MonitorState::UserAway);
    }

    #[test]
    fn test_away_needs_frames_or_low_confidence() {
        let mut sm = started();
        // mildly negative confidence, few frames spread over a long time
        assert!(sm.update(false, -1.0, 1000).is_none());
        assert!(sm.update(false, -1.0, 5000).is_none());
        assert_eq!(sm.state(), MonitorState::Monitoring);

        // confidence at the away threshold satisfies the evidence gate
        let t = sm.update(false, -3.0, 5100).unwrap();
        assert_eq!(t.to, MonitorState::UserAway);
    }

    #[test]
    fn test_transition_reported_once() {
        let mut sm = started();
        let t = go_away(&mut sm);
        assert!(sm.update(false, -8.0, t + 100).is_none());
        assert!(sm.update(false, -8.0, t + 200).is_none());
    }

    #[test]
    fn test_presence_resets_absence_clock() {
        let mut sm = started();
        sm.update(false, -9.0, 100);
        sm.update(false, -9.0, 2000);
        sm.update(true, 1.0, 2100);
        assert_eq!(sm.absent_since(), None);
        assert!(sm.update(false, -9.0, 3500).is_none());
        assert!(sm.update(false, -9.0, 5000).is_none());
        assert_eq!(sm.state(), MonitorState::Monitoring);
    }

    #[test]
    fn test_return_requires_two_present_frames() {
        let mut sm = started();
        let t = go_away(&mut sm);

        assert!(sm.update(true, 5.0, t + 100).is_none());
        assert!(sm.update(false, 5.0, t + 200).is_none());
        assert!(sm.update(true, 5.0, t + 300).is_none());
        assert_eq!(sm.state(), MonitorState::UserAway);

        let back = sm.update(true, 5.0, t + 400).unwrap();
        assert_eq!(back.from, MonitorState::UserAway);
        assert_eq!(back.to, MonitorState::Monitoring);
    }

    #[test]
    fn test_slow_return_needs_confidence() {
        let mut sm = started();
        let t = go_away(&mut sm);

        // frames a second apart: no quick-return path, 2 * 2.0 / 5 < 1
        sm.update(true, 2.0, t + 1000);
        assert!(sm.update(true, 2.0, t + 2000).is_none());
        // 3 * 2.0 / 5 >= 1
        assert!(sm.update(true, 2.0, t + 3000).is_some());
    }

    #[test]
    fn test_restart_from_away() {
        let mut sm = started();
        go_away(&mut sm);
        let t = sm.start(100_000).unwrap();
        assert_eq!(t.from, MonitorState::UserAway);
        assert_eq!(sm.absent_since(), None);
        assert_eq!(sm.consecutive_absent(), 0);
    }
}
