//! Alerting System
//!
//! Provides issue debouncing, alert escalation, and command deduplication.

mod command;
mod config;
mod debouncer;
mod escalator;
mod issue;

pub use command::{Command, UnknownCommand};
pub use config::AlertConfig;
pub use debouncer::IssueDebouncer;
pub use escalator::{AlertEscalator, AwayEscalator, MAX_LEVEL, STATUS_OK};
pub use issue::{ActiveIssue, IssueDelta, IssueType};
