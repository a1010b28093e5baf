//! Engine Configuration
//!
//! Loaded from a TOML file; every field has a default so an empty or
//! missing file yields a working configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// Who receives a completed quest's rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardAudience {
    /// Every currently connected player
    #[default]
    Online,
    /// Only the quest's recipient, and only while connected
    Recipient,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one TOML record per quest
    pub quests_dir: PathBuf,
    pub reward_audience: RewardAudience,
    /// Default tracing directive, combined with RUST_LOG
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quests_dir: PathBuf::from("data/quests"),
            reward_audience: RewardAudience::default(),
            log_filter: "quest_engine=info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_for_empty_document() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.reward_audience, RewardAudience::Online);
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_toml(
            r#"
quests_dir = "/srv/quests"
reward_audience = "recipient"
"#,
        )
        .unwrap();

        assert_eq!(config.quests_dir, PathBuf::from("/srv/quests"));
        assert_eq!(config.reward_audience, RewardAudience::Recipient);
        assert_eq!(config.log_filter, "quest_engine=info");
    }

    #[test]
    fn test_rejects_unknown_audience() {
        assert!(EngineConfig::from_toml(r#"reward_audience = "everyone""#).is_err());
    }

    #[test]
    fn test_load_missing_and_present_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("quest-engine.toml");

        assert_eq!(EngineConfig::load(&path).unwrap(), EngineConfig::default());

        std::fs::write(&path, "log_filter = \"quest_engine=debug\"\n").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().log_filter, "quest_engine=debug");

        std::fs::write(&path, "reward_audience = 3\n").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Parse { path: p, .. }) if p == path
        ));
    }

    #[test]
    fn test_unreadable_config_is_io_error() {
        let temp_dir = TempDir::new().unwrap();

        // A directory exists but cannot be read as a file
        assert!(matches!(
            EngineConfig::load(temp_dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }
}
