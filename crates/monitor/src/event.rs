//! Engine results and events

use alerting::{ActiveIssue, Command, IssueDelta, IssueType};
use posture::PostureReading;
use presence::{MonitorState, StateTransition};
use serde::Serialize;

/// Per-frame numbers worth logging or charting
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameDiagnostics {
    pub timestamp_ms: u64,
    pub elapsed_ms: u64,
    pub face_detected: bool,
    pub pose_landmarks: usize,
    pub motion: f32,
    /// Presence score before noise adaptation
    pub raw_score: f32,
    /// Score fed to the accumulator
    pub score: f32,
    pub confidence: f32,
    pub present: bool,
    pub state: MonitorState,
}

/// Everything one frame evaluation decided
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// Presence transition, reported only on the edge
    pub transition: Option<StateTransition>,
    /// Posture reading, when the person was present and the angles could be computed
    pub posture: Option<PostureReading>,
    /// Issues raised or cleared by this frame
    pub delta: IssueDelta,
    /// Active issues after this frame, in detection order
    pub active: Vec<ActiveIssue>,
    /// Commands to transmit, in decision order
    pub commands: Vec<Command>,
    /// "posture correct" or the primary issue's description
    pub status: &'static str,
    pub diagnostics: FrameDiagnostics,
}

impl FrameOutcome {
    /// Typed events in the order they happened
    pub fn events(&self) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        if let Some(transition) = self.transition {
            events.push(MonitorEvent::StateChanged(transition));
        }
        events.extend(
            self.delta
                .raised
                .iter()
                .map(|&issue| MonitorEvent::IssueRaised { issue }),
        );
        events.extend(
            self.delta
                .cleared
                .iter()
                .map(|&issue| MonitorEvent::IssueCleared { issue }),
        );
        events.extend(
            self.commands
                .iter()
                .map(|&command| MonitorEvent::Command { command }),
        );
        events.push(MonitorEvent::Diagnostics(self.diagnostics));
        events
    }
}

/// Result of start, stop, and release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlOutcome {
    pub transition: Option<StateTransition>,
    pub command: Option<Command>,
}

impl ControlOutcome {
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.transition
            .map(MonitorEvent::StateChanged)
            .into_iter()
            .chain(self.command.map(|command| MonitorEvent::Command { command }))
            .collect()
    }
}

/// Structured notification published to observers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    StateChanged(StateTransition),
    IssueRaised { issue: IssueType },
    IssueCleared { issue: IssueType },
    Command { command: Command },
    Diagnostics(FrameDiagnostics),
}

