//! Issue types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A distinct problem that can be active at the same time as others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    HeadForwardTilt,
    HeadBackwardTilt,
    HeadSideTilt,
    HeadRollTilt,
    ShoulderTilt,
    Drowsiness,
    UserAway,
}

impl IssueType {
    /// All issue types, in evaluation order
    pub const ALL: [IssueType; 7] = [
        IssueType::HeadForwardTilt,
        IssueType::HeadBackwardTilt,
        IssueType::HeadSideTilt,
        IssueType::HeadRollTilt,
        IssueType::ShoulderTilt,
        IssueType::Drowsiness,
        IssueType::UserAway,
    ];

    /// Human-readable description for status text
    pub fn description(&self) -> &'static str {
        match self {
            IssueType::HeadForwardTilt => "head tilted forward",
            IssueType::HeadBackwardTilt => "head tilted backward",
            IssueType::HeadSideTilt => "head turned to the side",
            IssueType::HeadRollTilt => "head tilted sideways",
            IssueType::ShoulderTilt => "shoulder tilt",
            IssueType::Drowsiness => "drowsiness detected",
            IssueType::UserAway => "user away",
        }
    }

    pub fn is_posture(&self) -> bool {
        !matches!(self, IssueType::Drowsiness | IssueType::UserAway)
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// An issue that persisted past its debounce duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveIssue {
    pub issue: IssueType,
    pub description: &'static str,
    /// When the condition was first observed (milliseconds)
    pub first_observed_ms: u64,
}

/// Changes to the active issue set produced by one update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDelta {
    pub raised: Vec<IssueType>,
    pub cleared: Vec<IssueType>,
}

impl IssueDelta {
    pub fn is_empty(&self) -> bool {
        self.raised.is_empty() && self.cleared.is_empty()
    }
}
