//! Configuration system for the pipeline controller.
//!
//! This module defines the configuration structures used to parameterize the controller.
//! It provides:
//! 1. **Defaults:** Baseline constants (initial PC, history depth).
//! 2. **Structures:** Hierarchical config for general, history and breakpoint settings.
//!
//! Configuration is supplied as JSON from the embedding environment, or use `Config::default()`.

use serde::Deserialize;

/// Default configuration constants for the controller.
mod defaults {
    /// Program counter loaded on reset.
    pub const INITIAL_PC: u64 = 0;

    /// Number of clock cycles that can be undone.
    ///
    /// Each recorded cycle holds a copy of the stage track plus the register and memory
    /// values the cycle overwrote.
    pub const MAX_REVERSE_CYCLES: usize = 100;

    /// Whether observers are notified after clock, reverse and reset.
    pub const EMIT_NOTIFICATIONS: bool = true;
}

/// Root configuration structure containing all controller settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use pipeview_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.general.initial_pc, 0);
/// assert_eq!(config.history.max_reverse_cycles, 100);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use pipeview_core::config::Config;
///
/// let json = r#"{
///     "general": { "initial_pc": 4096, "emit_notifications": false },
///     "history": { "max_reverse_cycles": 16 },
///     "breakpoints": { "trigger_stages": [0] }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.initial_pc, 0x1000);
/// assert!(!config.general.emit_notifications);
/// assert_eq!(config.history.max_reverse_cycles, 16);
/// assert_eq!(config.breakpoints.trigger_stages, vec![0]);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General controller settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Reversible history settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Breakpoint detection settings.
    #[serde(default)]
    pub breakpoints: BreakpointConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing sections and fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the document is malformed or a field has the
    /// wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// General controller settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Program counter value loaded on reset.
    #[serde(default = "GeneralConfig::default_initial_pc")]
    pub initial_pc: u64,

    /// Notify observers after clock, reverse and reset. Batch runners turn this off.
    #[serde(default = "GeneralConfig::default_emit_notifications")]
    pub emit_notifications: bool,
}

impl GeneralConfig {
    fn default_initial_pc() -> u64 {
        defaults::INITIAL_PC
    }

    fn default_emit_notifications() -> bool {
        defaults::EMIT_NOTIFICATIONS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            initial_pc: defaults::INITIAL_PC,
            emit_notifications: defaults::EMIT_NOTIFICATIONS,
        }
    }
}

/// Reversible history settings.
///
/// Only consulted when the processor declares the reversible capability.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of cycles that can be reversed. Older cycles are dropped.
    #[serde(default = "HistoryConfig::default_max_reverse_cycles")]
    pub max_reverse_cycles: usize,
}

impl HistoryConfig {
    fn default_max_reverse_cycles() -> usize {
        defaults::MAX_REVERSE_CYCLES
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_reverse_cycles: defaults::MAX_REVERSE_CYCLES,
        }
    }
}

/// Breakpoint detection settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BreakpointConfig {
    /// Stage indices that report breakpoint hits. Empty means every stage.
    #[serde(default)]
    pub trigger_stages: Vec<usize>,
}
