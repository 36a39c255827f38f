//! Posture Monitor Engine
//!
//! Fuses presence and posture evidence into debounced, escalated,
//! deduplicated peripheral commands. Synchronous: one call per frame,
//! plus a timer entry point for away escalation.

mod config;
mod engine;
mod event;

pub use config::MonitorConfig;
pub use engine::{MonitorEngine, SessionStats};
pub use event::{ControlOutcome, FrameDiagnostics, FrameOutcome, MonitorEvent};

pub use alerting::{Command, IssueType};
pub use landmarks::LandmarkFrame;
pub use presence::{MonitorState, StateTransition};

use thiserror::Error;

/// Engine error types
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Monitoring has not been started")]
    NotStarted,

    #[error("Engine has been released")]
    Released,
}
