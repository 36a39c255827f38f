//! Peripheral command vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Command sent to the peripheral. Serialized as its tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Command {
    /// No active issue
    Normal,
    /// Posture problem, level 1, 3, or 5
    PostureAlert(u8),
    /// Drowsiness, leveled when the level is above 1
    DrowsinessAlert(u8),
    /// Attention / absence issue, leveled when the level is above 1
    FocusAlert(u8),
    /// Long absence from the away timer, level 1, 3, or 5
    UserAway(u8),
    /// Person came back after being away
    UserReturn,
    /// Link heartbeat
    Keepalive,
}

/// Tag that does not name a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown command tag: {0}")]
pub struct UnknownCommand(pub String);

impl Command {
    /// Alert commands are everything except the link heartbeat
    pub fn is_alert(&self) -> bool {
        !matches!(self, Command::Keepalive)
    }

    /// Escalation level, where the command has one
    pub fn level(&self) -> Option<u8> {
        match self {
            Command::PostureAlert(l)
            | Command::DrowsinessAlert(l)
            | Command::FocusAlert(l)
            | Command::UserAway(l) => Some(*l),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Normal => f.write_str("NORMAL"),
            Command::PostureAlert(level) => write!(f, "POSTURE_ALERT_L{}", level),
            Command::DrowsinessAlert(level) if *level > 1 => write!(f, "DROWSINESS_ALERT_L{}", level),
            Command::DrowsinessAlert(_) => f.write_str("DROWSINESS_ALERT"),
            Command::FocusAlert(level) if *level > 1 => write!(f, "FOCUS_ALERT_L{}", level),
            Command::FocusAlert(_) => f.write_str("FOCUS_ALERT"),
            Command::UserAway(level) => write!(f, "USER_AWAY_L{}", level),
            Command::UserReturn => f.write_str("USER_RETURN"),
            Command::Keepalive => f.write_str("KEEPALIVE"),
        }
    }
}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCommand(tag.to_string());

        match tag {
            "NORMAL" => return Ok(Command::Normal),
            "DROWSINESS_ALERT" => return Ok(Command::DrowsinessAlert(1)),
            "FOCUS_ALERT" => return Ok(Command::FocusAlert(1)),
            "USER_RETURN" => return Ok(Command::UserReturn),
            "KEEPALIVE" => return Ok(Command::Keepalive),
            _ => {}
        }

        let (name, level) = tag.rsplit_once("_L").ok_or_else(unknown)?;
        let level: u8 = level.parse().map_err(|_| unknown())?;
        if level == 0 || level > 5 {
            return Err(unknown());
        }

        match name {
            "POSTURE_ALERT" => Ok(Command::PostureAlert(level)),
            "DROWSINESS_ALERT" if level > 1 => Ok(Command::DrowsinessAlert(level)),
            "FOCUS_ALERT" if level > 1 => Ok(Command::FocusAlert(level)),
            "USER_AWAY" => Ok(Command::UserAway(level)),
            _ => Err(unknown()),
        }
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.to_string()
    }
}

impl TryFrom<String> for Command {
    type Error = UnknownCommand;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}
