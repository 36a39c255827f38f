//! Application settings
//!
//! Loaded from an optional TOML file, then `SENTINEL__*` environment
//! variables (`SENTINEL__LINK__DEVICE=/dev/ttyACM0`).

use config::{Config, ConfigError, Environment, File, FileFormat};
use monitor::MonitorConfig;
use monitor_runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// trace, debug, info, warn, or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Peripheral link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Serial device path
    pub device: String,
    pub baud_rate: u32,
    /// Per-command write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            write_timeout_ms: 2000,
        }
    }
}

/// Named posture threshold sets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosturePreset {
    /// Use `monitor.posture` as configured
    #[default]
    Custom,
    Strict,
    Lenient,
}

/// Everything the binary reads at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub link: LinkSettings,
    pub runtime: RuntimeConfig,
    pub monitor: MonitorConfig,
    pub posture_preset: PosturePreset,
}

impl Settings {
    /// Load from `path` (or `./sentinel.toml` if present) plus environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::with_name("sentinel").format(FileFormat::Toml).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Parse settings from TOML text alone
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Engine configuration with the posture preset applied
    pub fn monitor_config(&self) -> MonitorConfig {
        let mut config = self.monitor.clone();
        match self.posture_preset {
            PosturePreset::Custom => {}
            PosturePreset::Strict => config.posture = MonitorConfig::strict().posture,
            PosturePreset::Lenient => config.posture = MonitorConfig::lenient().posture,
        }
        config
    }
}

fn environment() -> Environment {
    Environment::with_prefix("SENTINEL")
        .separator("__")
        .try_parsing(true)
}
