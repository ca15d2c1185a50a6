//! Engine configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Query limits.
    pub store: StoreConfig,
    /// Pattern analysis thresholds.
    pub patterns: PatternConfig,
    /// Escalation routing.
    pub escalation: EscalationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum page size for list queries. Clamped to the store's
    /// hard cap.
    pub max_page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// A type with at least this many in-window complaints is a
    /// recurring pattern.
    pub repetition_threshold: usize,
    /// Total in-window complaints above this triggers the volume
    /// advisory.
    pub volume_threshold: usize,
    /// Similarity window for `find_similar_complaints`, in hours.
    pub similar_window_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Authority auto-escalations are routed to.
    pub authority: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            patterns: PatternConfig::default(),
            escalation: EscalationConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_page_size: 100 }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            repetition_threshold: 5,
            volume_threshold: 10,
            similar_window_hours: 24,
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            authority: "AI Safety Observer".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, falling back to defaults when the file
    /// is missing or malformed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), "malformed engine config, using defaults: {e}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.patterns.repetition_threshold, 5);
        assert_eq!(config.patterns.similar_window_hours, 24);
        assert_eq!(config.escalation.authority, "AI Safety Observer");
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let config: EngineConfig =
            toml::from_str("[patterns]\nrepetition_threshold = 3\n").unwrap();
        assert_eq!(config.patterns.repetition_threshold, 3);
        // Untouched sections keep defaults.
        assert_eq!(config.patterns.volume_threshold, 10);
        assert_eq!(config.store.max_page_size, 100);
    }

    #[test]
    fn dump_round_trips() {
        let config = EngineConfig::default();
        let parsed: EngineConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.escalation.authority, config.escalation.authority);
    }
}
