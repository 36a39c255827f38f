//! Presence Detection
//!
//! Decides, frame by frame, whether a person is in front of the camera:
//! - Motion tracking over a short position history
//! - Weighted presence scoring with environmental noise adaptation
//! - Time-adaptive confidence accumulation
//! - Monitoring / user-away state machine with asymmetric hysteresis

pub mod confidence;
pub mod config;
pub mod motion;
pub mod scorer;
pub mod state;

pub use confidence::ConfidenceAccumulator;
pub use config::PresenceConfig;
pub use motion::MotionTracker;
pub use scorer::{NoiseFloor, PresenceScorer};
pub use state::{MonitorState, PresenceEvidence, PresenceStateMachine, StateTransition};
