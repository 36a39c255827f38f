//! Alert escalation and command deduplication

use crate::command::Command;
use crate::issue::{ActiveIssue, IssueType};
use tracing::{debug, info};

/// Highest escalation level
pub const MAX_LEVEL: u8 = 5;

/// Status text when nothing is wrong
pub const STATUS_OK: &str = "posture correct";

/// Maps the active issue set to one command and suppresses repeats
#[derive(Debug, Clone, Default)]
pub struct AlertEscalator {
    last_sent: Option<Command>,
}

impl AlertEscalator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command for an active issue set
    pub fn escalate(active: &[ActiveIssue]) -> Command {
        if active.is_empty() {
            return Command::Normal;
        }

        let has = |issue: IssueType| active.iter().any(|a| a.issue == issue);
        let stacked = (active.len() + 1).min(MAX_LEVEL as usize) as u8;

        if has(IssueType::Drowsiness) {
            Command::DrowsinessAlert(stacked)
        } else if has(IssueType::UserAway) {
            Command::FocusAlert(stacked)
        } else {
            let level = match active.len() {
                0 | 1 => 1,
                2 => 3,
                _ => 5,
            };
            Command::PostureAlert(level)
        }
    }

    /// Status line: the primary issue's description, or [`STATUS_OK`]
    pub fn status(active: &[ActiveIssue]) -> &'static str {
        active.first().map(|a| a.description).unwrap_or(STATUS_OK)
    }

    /// Pass a command through unless it repeats the last one sent
    pub fn offer(&mut self, command: Command) -> Option<Command> {
        if self.last_sent == Some(command) {
            debug!("Suppressed duplicate command {}", command);
            return None;
        }
        info!("Command decided: {}", command);
        self.last_sent = Some(command);
        Some(command)
    }

    pub fn last_sent(&self) -> Option<Command> {
        self.last_sent
    }
}

/// Escalates an ongoing absence by elapsed time, independent of frames
#[derive(Debug, Clone)]
pub struct AwayEscalator {
    /// Thresholds for levels 1, 3, and 5 (milliseconds)
    levels_ms: [u64; 3],
    away_since: Option<u64>,
    level_sent: u8,
}

impl AwayEscalator {
    pub fn new(levels_ms: [u64; 3]) -> Self {
        Self {
            levels_ms,
            away_since: None,
            level_sent: 0,
        }
    }

    /// Start timing an absence that began at `since_ms`
    pub fn begin(&mut self, since_ms: u64) {
        if self.away_since.is_none() {
            info!("Away escalation armed (absent since {}ms)", since_ms);
            self.away_since = Some(since_ms);
            self.level_sent = 0;
        }
    }

    /// Leveled away command when a new level has been reached
    pub fn tick(&mut self, now_ms: u64) -> Option<Command> {
        let since = self.away_since?;
        let away_for = now_ms.saturating_sub(since);

        let level = self
            .levels_ms
            .iter()
            .zip([1u8, 3, 5])
            .filter(|(threshold, _)| away_for >= **threshold)
            .map(|(_, level)| level)
            .last()?;

        if level > self.level_sent {
            info!("Away for {}s, escalating to level {}", away_for / 1000, level);
            self.level_sent = level;
            Some(Command::UserAway(level))
        } else {
            None
        }
    }

    /// Stop timing; returns the return command if an absence was in progress
    pub fn end(&mut self) -> Option<Command> {
        self.away_since.take().map(|_| {
            self.level_sent = 0;
            Command::UserReturn
        })
    }

    pub fn is_armed(&self) -> bool {
        self.away_since.is_some()
    }

    /// Disarm without emitting anything
    pub fn cancel(&mut self) {
        self.away_since = None;
        self.level_sent = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(issues: &[IssueType]) -> Vec<ActiveIssue> {
        issues
            .iter()
            .map(|&issue| ActiveIssue {
                issue,
                description: issue.description(),
                first_observed_ms: 0,
            })
            .collect()
    }

    #[test]
    fn test_empty_is_normal() {
        assert_eq!(AlertEscalator::escalate(&[]), Command::Normal);
        assert_eq!(AlertEscalator::status(&[]), "posture correct");
    }

    #[test]
    fn test_posture_levels() {
        let one = active(&[IssueType::ShoulderTilt]);
        let two = active(&[IssueType::ShoulderTilt, IssueType::HeadRollTilt]);
        let three = active(&[
            IssueType::ShoulderTilt,
            IssueType::HeadRollTilt,
            IssueType::HeadForwardTilt,
        ]);

        assert_eq!(AlertEscalator::escalate(&one), Command::PostureAlert(1));
        assert_eq!(AlertEscalator::escalate(&two), Command::PostureAlert(3));
        assert_eq!(AlertEscalator::escalate(&three).to_string(), "POSTURE_ALERT_L5");
    }

    #[test]
    fn test_drowsiness_takes_precedence() {
        let issues = active(&[IssueType::ShoulderTilt, IssueType::Drowsiness]);
        assert_eq!(AlertEscalator::escalate(&issues), Command::DrowsinessAlert(3));
        assert_eq!(AlertEscalator::status(&issues), "shoulder tilt");
    }

    #[test]
    fn test_focus_alert_level_capped() {
        let issues = active(&[
            IssueType::UserAway,
            IssueType::HeadForwardTilt,
            IssueType::HeadSideTilt,
            IssueType::HeadRollTilt,
            IssueType::ShoulderTilt,
        ]);
        assert_eq!(AlertEscalator::escalate(&issues), Command::FocusAlert(5));
        assert_eq!(
            AlertEscalator::escalate(&active(&[IssueType::UserAway])).to_string(),
            "FOCUS_ALERT_L2"
        );
    }

    #[test]
    fn test_duplicates_suppressed() {
        let mut e = AlertEscalator::new();
        assert_eq!(e.offer(Command::Normal), Some(Command::Normal));
        assert_eq!(e.offer(Command::Normal), None);
        assert_eq!(e.offer(Command::PostureAlert(1)), Some(Command::PostureAlert(1)));
        assert_eq!(e.offer(Command::Normal), Some(Command::Normal));
    }

    #[test]
    fn test_away_levels() {
        let mut away = AwayEscalator::new([30_000, 120_000, 300_000]);
        assert_eq!(away.tick(1_000_000), None);

        away.begin(1000);
        assert_eq!(away.tick(20_000), None);
        assert_eq!(away.tick(31_000), Some(Command::UserAway(1)));
        assert_eq!(away.tick(41_000), None);
        assert_eq!(away.tick(121_000), Some(Command::UserAway(3)));
        assert_eq!(away.tick(301_000), Some(Command::UserAway(5)));
        assert_eq!(away.tick(900_000), None);

        assert_eq!(away.end(), Some(Command::UserReturn));
        assert_eq!(away.end(), None);
    }

    #[test]
    fn test_away_skips_to_highest_reached() {
        let mut away = AwayEscalator::new([30_000, 120_000, 300_000]);
        away.begin(0);
        assert_eq!(away.tick(130_000), Some(Command::UserAway(3)));
        assert_eq!(away.tick(140_000), None);
    }
}
