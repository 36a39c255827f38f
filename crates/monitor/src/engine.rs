//! Monitor engine
//!
//! Runs the full per-frame pipeline: sanitize, motion, presence score,
//! confidence, presence state, posture, debounce, escalate. One engine
//! per monitoring session; frames are evaluated strictly one at a time.

use crate::config::MonitorConfig;
use crate::event::{ControlOutcome, FrameDiagnostics, FrameOutcome};
use crate::MonitorError;
use alerting::{AlertEscalator, AwayEscalator, Command, IssueDebouncer, IssueType};
use landmarks::{FrameValidator, LandmarkFrame};
use posture::{PostureEvaluator, PostureSignals};
use presence::{
    ConfidenceAccumulator, MonitorState, MotionTracker, NoiseFloor, PresenceEvidence,
    PresenceScorer, PresenceStateMachine, StateTransition,
};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, info};

/// Counters for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub started_at_ms: Option<u64>,
    pub frames_evaluated: u64,
    pub frames_absent: u64,
    /// Frames the validator had to repair
    pub frames_sanitized: u64,
    pub commands_issued: u64,
    pub transitions: u64,
}

/// The decision engine
pub struct MonitorEngine {
    config: MonitorConfig,
    validator: FrameValidator,
    motion: MotionTracker,
    scorer: PresenceScorer,
    noise: NoiseFloor,
    confidence: ConfidenceAccumulator,
    presence: PresenceStateMachine,
    posture: PostureEvaluator,
    debouncer: IssueDebouncer,
    escalator: AlertEscalator,
    away: AwayEscalator,
    last_frame_at: Option<u64>,
    stats: SessionStats,
    released: bool,
}

impl MonitorEngine {
    pub fn new(config: MonitorConfig) -> Self {
        let p = &config.presence;
        Self {
            validator: FrameValidator::new(config.validation.clone()),
            motion: MotionTracker::new(p.motion_history, p.motion_threshold, p.visibility_threshold),
            scorer: PresenceScorer::new(p),
            noise: NoiseFloor::new(p.noise_learning_frames, p.noise_margin),
            confidence: ConfidenceAccumulator::new(p.confidence_limit),
            presence: PresenceStateMachine::new(p.clone()),
            posture: PostureEvaluator::new(config.posture.clone()),
            debouncer: IssueDebouncer::new(config.alerts.clone()),
            escalator: AlertEscalator::new(),
            away: AwayEscalator::new(config.alerts.away_levels_ms),
            last_frame_at: None,
            stats: SessionStats::default(),
            released: false,
            config,
        }
    }

    /// Begin (or restart) a monitoring session.
    ///
    /// Clears confidence, calibration, and issues, and puts the peripheral
    /// into a known state with a `NORMAL` command unless that was the last
    /// command sent.
    pub fn start(&mut self, now_ms: u64) -> Result<ControlOutcome, MonitorError> {
        self.ensure_open()?;

        self.reset_session();
        self.stats = SessionStats {
            started_at_ms: Some(now_ms),
            ..Default::default()
        };

        let transition = self.presence.start(now_ms);
        let command = self.issue(Command::Normal);
        self.count_transition(transition);

        info!("Monitoring session started at {}ms", now_ms);
        Ok(ControlOutcome { transition, command })
    }

    /// End the session. Returns `NORMAL` if an alert was left showing.
    pub fn stop(&mut self, now_ms: u64) -> Result<ControlOutcome, MonitorError> {
        self.ensure_open()?;
        Ok(self.shutdown(now_ms))
    }

    /// Stop and retire the engine. Safe to call more than once.
    pub fn release(&mut self, now_ms: u64) -> ControlOutcome {
        if self.released {
            debug!("Engine already released");
            return ControlOutcome::default();
        }
        let outcome = self.shutdown(now_ms);
        self.released = true;
        info!("Engine released");
        outcome
    }

    fn shutdown(&mut self, now_ms: u64) -> ControlOutcome {
        let was_running = self.presence.state() != MonitorState::Idle;

        let command = match self.escalator.last_sent() {
            Some(last) if last != Command::Normal => self.issue(Command::Normal),
            _ => None,
        };

        self.reset_session();
        let transition = self.presence.stop(now_ms);
        self.count_transition(transition);

        if was_running {
            info!(
                "Monitoring stopped after {} frames ({} absent, {} commands)",
                self.stats.frames_evaluated, self.stats.frames_absent, self.stats.commands_issued
            );
        }
        ControlOutcome { transition, command }
    }

    fn reset_session(&mut self) {
        self.motion.reset();
        self.noise.reset();
        self.confidence.reset();
        self.posture.recalibrate();
        self.debouncer.clear();
        self.away.cancel();
        self.last_frame_at = None;
    }

    /// Evaluate one landmark frame. Timing uses the frame's timestamp.
    pub fn evaluate(&mut self, frame: &LandmarkFrame) -> Result<FrameOutcome, MonitorError> {
        self.ensure_open()?;
        if self.presence.state() == MonitorState::Idle {
            return Err(MonitorError::NotStarted);
        }

        let frame = if self.validator.validate(frame).valid {
            Cow::Borrowed(frame)
        } else {
            self.stats.frames_sanitized += 1;
            Cow::Owned(self.validator.sanitize(frame))
        };

        let now = frame.timestamp_ms;
        let elapsed = self
            .last_frame_at
            .map(|last| now.saturating_sub(last))
            .unwrap_or(0);
        self.last_frame_at = Some(now.max(self.last_frame_at.unwrap_or(0)));

        let visibility = self.config.presence.visibility_threshold;
        let motion = self.motion.update(&frame);
        let raw_score = self
            .scorer
            .score(frame.face.as_ref(), frame.pose.as_ref(), motion, elapsed);
        let score = self.noise.adapt(raw_score);
        let confidence = self.confidence.update(score, elapsed);

        let evidence = PresenceEvidence {
            has_tracking_id: frame.face.as_ref().is_some_and(|f| f.tracking_id.is_some()),
            has_eye_openness: frame.face.as_ref().is_some_and(|f| f.eye_openness().is_some()),
            pose_landmarks: frame
                .pose
                .as_ref()
                .map_or(0, |p| p.visible_count(visibility)),
        };
        let present = self.presence.is_present(&evidence, confidence);
        let transition = self.presence.update(present, confidence, now);
        self.count_transition(transition);

        let mut commands = Vec::new();
        if let Some(t) = transition {
            commands.extend(self.on_transition(t));
        }

        let away = self.presence.state() == MonitorState::UserAway;
        let posture = if present {
            self.posture.evaluate(&frame)
        } else {
            None
        };
        let mut reported = posture
            .as_ref()
            .map(|reading| issues_from(&reading.signals))
            .unwrap_or_default();
        // Away holds until the return is confirmed
        if !present || away {
            reported.push(IssueType::UserAway);
        }

        // Without a reading, posture issues keep their standing until the user is away
        let scope: &[IssueType] = if posture.is_some() || away {
            &IssueType::ALL
        } else {
            &[IssueType::UserAway]
        };
        let delta = self.debouncer.update_scoped(scope, &reported, now);
        if !delta.is_empty() {
            commands.extend(self.issue(AlertEscalator::escalate(self.debouncer.active())));
        }

        self.stats.frames_evaluated += 1;
        if !present {
            self.stats.frames_absent += 1;
        }

        let diagnostics = FrameDiagnostics {
            timestamp_ms: now,
            elapsed_ms: elapsed,
            face_detected: frame.face.is_some(),
            pose_landmarks: evidence.pose_landmarks,
            motion,
            raw_score,
            score,
            confidence,
            present,
            state: self.presence.state(),
        };
        debug!(
            "Frame {}ms: present={} confidence={:.2} state={:?}",
            now, present, confidence, diagnostics.state
        );

        Ok(FrameOutcome {
            transition,
            posture,
            delta,
            active: self.debouncer.active().to_vec(),
            commands,
            status: AlertEscalator::status(self.debouncer.active()),
            diagnostics,
        })
    }

    fn on_transition(&mut self, transition: StateTransition) -> Option<Command> {
        match transition.to {
            MonitorState::UserAway => {
                let since = self.presence.absent_since().unwrap_or(transition.at_ms);
                self.away.begin(since);
                None
            }
            MonitorState::Monitoring if transition.from == MonitorState::UserAway => {
                self.away.end().and_then(|cmd| self.issue(cmd))
            }
            _ => None,
        }
    }

    /// Timer path: leveled away command once the absence crosses a threshold
    pub fn check_away(&mut self, now_ms: u64) -> Option<Command> {
        if self.released || self.presence.state() != MonitorState::UserAway {
            return None;
        }
        let command = self.away.tick(now_ms)?;
        self.issue(command)
    }

    /// Drop the posture baseline; the next good reading becomes the new one
    pub fn recalibrate(&mut self) {
        info!("Posture recalibration requested");
        self.posture.recalibrate();
    }

    fn issue(&mut self, command: Command) -> Option<Command> {
        let sent = self.escalator.offer(command);
        if sent.is_some() {
            self.stats.commands_issued += 1;
        }
        sent
    }

    fn count_transition(&mut self, transition: Option<StateTransition>) {
        if let Some(t) = transition {
            info!("State {:?} -> {:?} at {}ms", t.from, t.to, t.at_ms);
            self.stats.transitions += 1;
        }
    }

    fn ensure_open(&self) -> Result<(), MonitorError> {
        if self.released {
            Err(MonitorError::Released)
        } else {
            Ok(())
        }
    }

    pub fn state(&self) -> MonitorState {
        self.presence.state()
    }

    pub fn confidence(&self) -> f32 {
        self.confidence.value()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn last_command(&self) -> Option<Command> {
        self.escalator.last_sent()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

/// Raw issue signals for a present person
fn issues_from(signals: &PostureSignals) -> Vec<IssueType> {
    [
        (signals.head_forward, IssueType::HeadForwardTilt),
        (signals.head_backward, IssueType::HeadBackwardTilt),
        (signals.head_side, IssueType::HeadSideTilt),
        (signals.head_roll, IssueType::HeadRollTilt),
        (signals.shoulder_tilt, IssueType::ShoulderTilt),
        (signals.drowsy, IssueType::Drowsiness),
    ]
    .into_iter()
    .filter_map(|(raised, issue)| raised.then_some(issue))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmarks::{FaceEvidence, LandmarkKind, PoseEvidence, PoseLandmark};

    fn started() -> MonitorEngine {
        let mut engine = MonitorEngine::new(MonitorConfig::default());
        let outcome = engine.start(0).unwrap();
        assert_eq!(outcome.command, Some(Command::Normal));
        engine
    }

    fn pose(landmarks: &[(LandmarkKind, f32, f32)]) -> PoseEvidence {
        PoseEvidence::new(
            landmarks
                .iter()
                .map(|&(kind, x, y)| PoseLandmark::new(kind, x, y, 0.9))
                .collect(),
        )
    }

    fn six_landmarks() -> PoseEvidence {
        pose(&[
            (LandmarkKind::Nose, 150.0, 100.0),
            (LandmarkKind::LeftEye, 140.0, 90.0),
            (LandmarkKind::RightEye, 160.0, 90.0),
            (LandmarkKind::LeftShoulder, 100.0, 200.0),
            (LandmarkKind::RightShoulder, 200.0, 200.0),
            (LandmarkKind::LeftElbow, 90.0, 300.0),
        ])
    }

    /// Shoulders with the right one dropped by `drop_px`
    fn upper_body(drop_px: f32) -> PoseEvidence {
        pose(&[
            (LandmarkKind::Nose, 150.0, 100.0),
            (LandmarkKind::LeftEye, 140.0, 90.0),
            (LandmarkKind::RightEye, 160.0, 90.0),
            (LandmarkKind::LeftEar, 125.0, 95.0),
            (LandmarkKind::RightEar, 175.0, 95.0),
            (LandmarkKind::LeftShoulder, 100.0, 200.0),
            (LandmarkKind::RightShoulder, 200.0, 200.0 + drop_px),
        ])
    }

    fn face(pitch: f32, roll: f32) -> FaceEvidence {
        FaceEvidence {
            head_euler_x: Some(pitch),
            head_euler_y: Some(0.0),
            head_euler_z: Some(roll),
            left_eye_open: Some(0.9),
            right_eye_open: Some(0.9),
            tracking_id: Some(7),
            ..Default::default()
        }
    }

    fn seated(ts: u64, pitch: f32, roll: f32, shoulder_drop: f32) -> LandmarkFrame {
        LandmarkFrame::empty(ts)
            .with_face(face(pitch, roll))
            .with_pose(upper_body(shoulder_drop))
    }

    #[test]
    fn test_evaluate_requires_start() {
        let mut engine = MonitorEngine::new(MonitorConfig::default());
        assert!(matches!(
            engine.evaluate(&LandmarkFrame::empty(0)),
            Err(MonitorError::NotStarted)
        ));
    }

    #[test]
    fn test_pose_only_then_stale_empty_frame() {
        let mut engine = started();

        for i in 1..=20u64 {
            let frame = LandmarkFrame::empty(i * 100).with_pose(six_landmarks());
            let outcome = engine.evaluate(&frame).unwrap();
            assert!(outcome.diagnostics.confidence > 0.0);
            assert!(outcome.diagnostics.present);
            assert_eq!(outcome.diagnostics.pose_landmarks, 6);
        }
        assert_eq!(engine.state(), MonitorState::Monitoring);

        let outcome = engine.evaluate(&LandmarkFrame::empty(2000 + 5000)).unwrap();
        assert!(outcome.diagnostics.confidence < -5.0);
        assert!(!outcome.diagnostics.present);
        assert_eq!(outcome.transition, None);
        assert_eq!(engine.state(), MonitorState::Monitoring);
    }

    #[test]
    fn test_shoulder_tilt_debounce() {
        let mut engine = started();

        // Calibrate on a level posture
        let calibration = engine.evaluate(&seated(1000, 0.0, 0.0, 0.0)).unwrap();
        assert!(calibration.posture.unwrap().calibrated);
        assert_eq!(calibration.status, "posture correct");

        let t0 = 2000;
        let first = engine.evaluate(&seated(t0, 0.0, 0.0, 30.0)).unwrap();
        assert!(first.posture.unwrap().signals.shoulder_tilt);
        assert!(first.commands.is_empty());

        let before = engine.evaluate(&seated(t0 + 1999, 0.0, 0.0, 30.0)).unwrap();
        assert!(before.active.is_empty());
        assert!(before.commands.is_empty());

        let after = engine.evaluate(&seated(t0 + 2001, 0.0, 0.0, 30.0)).unwrap();
        assert_eq!(after.delta.raised, vec![IssueType::ShoulderTilt]);
        assert_eq!(after.commands, vec![Command::PostureAlert(1)]);
        assert_eq!(after.status, "shoulder tilt");

        // Condition gone: cleared immediately, back to normal
        let fixed = engine.evaluate(&seated(t0 + 2100, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(fixed.delta.cleared, vec![IssueType::ShoulderTilt]);
        assert_eq!(fixed.commands, vec![Command::Normal]);
    }

    #[test]
    fn test_three_posture_issues_escalate_to_level_five() {
        let mut engine = started();
        engine.evaluate(&seated(1000, 0.0, 0.0, 0.0)).unwrap();

        let t0 = 2000;
        engine.evaluate(&seated(t0, -20.0, 15.0, 30.0)).unwrap();

        let two = engine.evaluate(&seated(t0 + 1500, -20.0, 15.0, 30.0)).unwrap();
        assert_eq!(two.commands, vec![Command::PostureAlert(3)]);
        assert_eq!(two.status, "head tilted forward");

        let three = engine.evaluate(&seated(t0 + 2001, -20.0, 15.0, 30.0)).unwrap();
        assert_eq!(three.commands.len(), 1);
        assert_eq!(three.commands[0].to_string(), "POSTURE_ALERT_L5");

        // Unchanged active set sends nothing
        let same = engine.evaluate(&seated(t0 + 2100, -20.0, 15.0, 30.0)).unwrap();
        assert!(same.commands.is_empty());
    }

    #[test]
    fn test_away_timer_without_frames() {
        let mut engine = started();

        let mut went_away = None;
        for i in 1..=35u64 {
            let outcome = engine.evaluate(&LandmarkFrame::empty(i * 100)).unwrap();
            if outcome.transition.is_some() {
                went_away = outcome.transition;
            }
        }
        let transition = went_away.unwrap();
        assert_eq!(transition.to, MonitorState::UserAway);
        assert!(transition.at_ms > 3100);
        assert_eq!(engine.last_command(), Some(Command::FocusAlert(2)));

        // No frames from here on; only the timer path runs
        assert_eq!(engine.check_away(10_000), None);
        assert_eq!(engine.check_away(31_000), Some(Command::UserAway(1)));
        assert_eq!(engine.check_away(40_000), None);
        assert_eq!(engine.check_away(121_000), Some(Command::UserAway(3)));
        assert_eq!(engine.check_away(301_000), Some(Command::UserAway(5)));
        assert_eq!(engine.check_away(400_000), None);

        let first_back = engine.evaluate(&seated(400_000, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(first_back.transition, None);
        assert!(first_back.commands.is_empty());
        assert_eq!(first_back.status, "user away");

        let back = engine.evaluate(&seated(400_100, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(back.transition.map(|t| t.to), Some(MonitorState::Monitoring));
        assert_eq!(back.commands, vec![Command::UserReturn, Command::Normal]);
        assert_eq!(engine.check_away(900_000), None);
    }

    #[test]
    fn test_present_then_absent_never_returns() {
        let mut engine = started();
        for i in 1..=35u64 {
            engine.evaluate(&LandmarkFrame::empty(i * 100)).unwrap();
        }
        assert_eq!(engine.state(), MonitorState::UserAway);

        let mut ts = 3600;
        for _ in 0..5 {
            assert!(engine.evaluate(&seated(ts, 0.0, 0.0, 0.0)).unwrap().diagnostics.present);
            assert!(!engine.evaluate(&LandmarkFrame::empty(ts + 3000)).unwrap().diagnostics.present);
            ts += 3100;
            assert_eq!(engine.state(), MonitorState::UserAway);
        }
    }

    #[test]
    fn test_stop_restores_normal_and_resets() {
        let mut engine = started();
        engine.evaluate(&seated(1000, 0.0, 0.0, 0.0)).unwrap();
        for ts in [2000, 3000, 4100] {
            engine.evaluate(&seated(ts, 0.0, 0.0, 30.0)).unwrap();
        }
        assert_eq!(engine.last_command(), Some(Command::PostureAlert(1)));

        let stopped = engine.stop(5000).unwrap();
        assert_eq!(stopped.command, Some(Command::Normal));
        assert_eq!(stopped.transition.map(|t| t.to), Some(MonitorState::Idle));
        assert_eq!(engine.state(), MonitorState::Idle);
        assert_eq!(engine.confidence(), 0.0);

        // Nothing showing, nothing to clear
        assert_eq!(engine.stop(5100).unwrap().command, None);
    }

    #[test]
    fn test_restart_recalibrates() {
        let mut engine = started();
        engine.evaluate(&seated(1000, 0.0, 0.0, 0.0)).unwrap();
        engine.stop(2000).unwrap();
        engine.start(3000).unwrap();

        // A tilted first frame becomes the new baseline instead of an issue
        let outcome = engine.evaluate(&seated(3100, 0.0, 0.0, 30.0)).unwrap();
        let reading = outcome.posture.unwrap();
        assert!(reading.calibrated);
        assert!(!reading.signals.shoulder_tilt);
    }

    #[test]
    fn test_recalibrate_adopts_current_posture() {
        let mut engine = started();
        engine.evaluate(&seated(1000, 0.0, 0.0, 0.0)).unwrap();
        assert!(engine.evaluate(&seated(1100, 0.0, 0.0, 30.0)).unwrap().posture.unwrap().signals.shoulder_tilt);

        engine.recalibrate();
        let reading = engine.evaluate(&seated(1200, 0.0, 0.0, 30.0)).unwrap().posture.unwrap();
        assert!(reading.calibrated);
        assert!(!reading.signals.shoulder_tilt);
    }

    #[test]
    fn test_face_dropout_keeps_posture_alert() {
        let mut engine = started();
        engine.evaluate(&seated(1000, 0.0, 0.0, 0.0)).unwrap();
        for ts in [2000, 3000, 3999] {
            engine.evaluate(&seated(ts, 0.0, 0.0, 30.0)).unwrap();
        }
        let alert = engine.evaluate(&seated(4001, 0.0, 0.0, 30.0)).unwrap();
        assert_eq!(alert.commands, vec![Command::PostureAlert(1)]);

        // Face detector misses one frame of the same tilted body
        let dropout = LandmarkFrame::empty(4100).with_pose(upper_body(30.0));
        let outcome = engine.evaluate(&dropout).unwrap();
        assert!(outcome.diagnostics.present);
        assert_eq!(outcome.posture, None);
        assert!(outcome.delta.is_empty());
        assert!(outcome.commands.is_empty());
        assert_eq!(outcome.status, "shoulder tilt");

        let again = engine.evaluate(&seated(4200, 0.0, 0.0, 30.0)).unwrap();
        assert!(again.commands.is_empty());
        assert_eq!(engine.last_command(), Some(Command::PostureAlert(1)));

        let fixed = engine.evaluate(&seated(4300, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(fixed.commands, vec![Command::Normal]);
    }

    #[test]
    fn test_head_angles_from_geometry_without_euler_angles() {
        let face = FaceEvidence {
            left_eye_open: Some(0.9),
            right_eye_open: Some(0.9),
            tracking_id: Some(7),
            ..Default::default()
        };
        let body = |nose_y: f32| {
            pose(&[
                (LandmarkKind::Nose, 150.0, nose_y),
                (LandmarkKind::LeftEye, 140.0, 90.0),
                (LandmarkKind::RightEye, 160.0, 90.0),
                (LandmarkKind::LeftEar, 125.0, 95.0),
                (LandmarkKind::RightEar, 175.0, 95.0),
                (LandmarkKind::LeftShoulder, 100.0, 200.0),
                (LandmarkKind::RightShoulder, 200.0, 200.0),
            ])
        };
        let frame = |ts: u64, nose_y: f32| {
            LandmarkFrame::empty(ts)
                .with_face(face.clone())
                .with_pose(body(nose_y))
        };

        let mut engine = started();
        assert!(engine.evaluate(&frame(1000, 100.0)).unwrap().posture.unwrap().calibrated);

        // Nose 40 below the ear line
        let dropped = engine.evaluate(&frame(2000, 135.0)).unwrap().posture.unwrap();
        assert!(dropped.deviation.head_x < -15.0);
        assert!(dropped.signals.head_forward);

        let alert = engine.evaluate(&frame(3501, 135.0)).unwrap();
        assert_eq!(alert.delta.raised, vec![IssueType::HeadForwardTilt]);
        assert_eq!(alert.commands, vec![Command::PostureAlert(1)]);
    }

    #[test]
    fn test_restart_does_not_repeat_normal() {
        let mut engine = started();
        assert_eq!(engine.stop(100).unwrap().command, None);
        assert_eq!(engine.start(200).unwrap().command, None);
        assert_eq!(engine.start(300).unwrap().command, None);
        assert_eq!(engine.last_command(), Some(Command::Normal));
    }

    #[test]
    fn test_no_command_repeats_across_paths_and_sessions() {
        let mut engine = MonitorEngine::new(MonitorConfig::default());
        let mut wire = Vec::new();

        wire.extend(engine.start(0).unwrap().command);
        wire.extend(engine.evaluate(&seated(100, 0.0, 0.0, 0.0)).unwrap().commands);
        for ts in [200, 1000, 2300] {
            wire.extend(engine.evaluate(&seated(ts, 0.0, 0.0, 30.0)).unwrap().commands);
        }
        wire.extend(engine.stop(2400).unwrap().command);
        wire.extend(engine.start(2500).unwrap().command);

        for i in 1..=40u64 {
            wire.extend(engine.evaluate(&LandmarkFrame::empty(2500 + i * 100)).unwrap().commands);
            wire.extend(engine.check_away(2500 + i * 100));
        }
        for ts in [40_000, 130_000, 130_500, 310_000] {
            wire.extend(engine.check_away(ts));
        }
        wire.extend(engine.evaluate(&seated(310_100, 0.0, 0.0, 0.0)).unwrap().commands);
        wire.extend(engine.evaluate(&seated(310_200, 0.0, 0.0, 0.0)).unwrap().commands);
        wire.extend(engine.stop(310_300).unwrap().command);
        wire.extend(engine.start(310_400).unwrap().command);

        assert!(wire.contains(&Command::PostureAlert(1)));
        assert!(wire.contains(&Command::UserAway(5)));
        assert!(wire.contains(&Command::UserReturn));
        for pair in wire.windows(2) {
            assert_ne!(pair[0], pair[1], "repeated command in {:?}", wire);
        }
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut engine = started();
        let first = engine.release(100);
        assert_eq!(first.transition.map(|t| t.to), Some(MonitorState::Idle));
        assert_eq!(engine.release(200), ControlOutcome::default());
        assert!(engine.is_released());
        assert!(matches!(engine.start(300), Err(MonitorError::Released)));
        assert_eq!(engine.check_away(1_000_000), None);
    }

    #[test]
    fn test_invalid_frame_is_sanitized_not_rejected() {
        let mut engine = started();
        let mut frame = seated(100, 0.0, 0.0, 0.0);
        if let Some(face) = frame.face.as_mut() {
            face.left_eye_open = Some(1.7);
        }
        let outcome = engine.evaluate(&frame).unwrap();
        assert!(outcome.diagnostics.present);
        assert_eq!(engine.stats().frames_sanitized, 1);
    }

    #[test]
    fn test_stats_and_events() {
        let mut engine = started();
        let outcome = engine.evaluate(&LandmarkFrame::empty(100)).unwrap();
        let events = outcome.events();
        assert!(matches!(events.last(), Some(crate::MonitorEvent::Diagnostics(_))));

        let json = serde_json::to_string(&events[0]).unwrap();
        assert!(json.contains("\"event\":\"diagnostics\""));

        let stats = engine.stats();
        assert_eq!(stats.started_at_ms, Some(0));
        assert_eq!(stats.frames_evaluated, 1);
        assert_eq!(stats.frames_absent, 1);
        assert_eq!(stats.commands_issued, 1);
        assert_eq!(stats.transitions, 1);
    }
}
