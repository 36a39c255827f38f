//! Monitor Runtime
//!
//! Cooperative task set around the decision engine:
//! - Frame pipeline (one frame at a time, busy frames dropped)
//! - Away escalation timer and detector starvation feed
//! - Command dispatcher with keepalive, sole owner of the peripheral link

mod clock;
mod config;
mod dispatcher;
mod handle;
mod pipeline;

pub use clock::Clock;
pub use config::RuntimeConfig;
pub use handle::{MonitorHandle, MonitorRuntime};

use monitor::MonitorError;
use thiserror::Error;

/// Runtime error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Pipeline busy, frame dropped")]
    Busy,

    #[error("Monitor runtime has been released")]
    Released,

    #[error("Engine rejected request: {0}")]
    Monitor(#[from] MonitorError),
}
