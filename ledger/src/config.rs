//! Ledger configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use lapse_types::{ConfigError, WindowParams};
use lapse_utils::LogFormat;
use lapse_window::WindowClock;

/// What a transfer does to the expiry of the value it moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPolicy {
    /// The receiver gets the sender's buckets with their original coordinate
    /// and creation tick; value expires when it would have for the sender.
    #[default]
    PreserveOrigin,
    /// The receiver gets one new bucket at the transfer tick.
    Remint,
}

/// Configuration for an expiring balance ledger.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Expiry treatment of transferred value.
    #[serde(default)]
    pub transfer_policy: TransferPolicy,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Window parameters (`[window]` table).
    #[serde(default)]
    pub window: WindowParams,
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string. Window bounds are checked.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.window.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The window clock these parameters describe.
    pub fn clock(&self) -> Result<WindowClock, ConfigError> {
        WindowClock::new(self.window)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            window: WindowParams::default(),
            transfer_policy: TransferPolicy::default(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
