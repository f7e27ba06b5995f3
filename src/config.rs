//! Configuration for the window detection pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration: SCADA connection parameters plus the zone-to-variable
/// mapping. The on-disk key names follow the deployed `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// SCADA endpoint and credentials
    #[serde(rename = "scada_params")]
    pub scada: ScadaParams,

    /// Monitored zones, keyed by zone name
    #[serde(rename = "variables")]
    pub zones: BTreeMap<String, ZoneConfig>,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("window-detect")
            .join("config.json")
    }

    /// Look up a zone by name.
    pub fn zone(&self, name: &str) -> Result<&ZoneConfig, ConfigError> {
        self.zones
            .get(name)
            .ok_or_else(|| ConfigError::UnknownZone(name.to_string()))
    }

    /// Copy with the SCADA password masked, for display.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if !shown.scada.password.is_empty() {
            shown.scada.password = "********".to_string();
        }
        shown
    }
}

/// SCADA server endpoint and credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScadaParams {
    pub url: String,
    pub username: String,
    pub password: String,
    pub project_id: String,
}

/// SCADA variable ids for one zone's four channels. The on-disk keys
/// `t_supply` and `ahu_fan` carry the supply-air temperature and fan power.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub t_in: String,
    pub t_out: String,
    #[serde(rename = "t_supply")]
    pub t_ahu: String,
    #[serde(rename = "ahu_fan")]
    pub p_ahu: String,
}

impl ZoneConfig {
    /// Channel name to variable id pairs, in pipeline order.
    pub fn variable_ids(&self) -> [(&'static str, &str); 4] {
        [
            ("t_in", self.t_in.as_str()),
            ("t_out", self.t_out.as_str()),
            ("t_ahu", self.t_ahu.as_str()),
            ("p_ahu", self.p_ahu.as_str()),
        ]
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    UnknownZone(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::UnknownZone(e) => write!(f, "Unknown zone: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYED_SHAPE: &str = r#"{
        "scada_params": {
            "url": "https://scada.example.com",
            "username": "reader",
            "password": "s3cret",
            "project_id": "plant-7"
        },
        "variables": {
            "office": {
                "t_in": "guid-in",
                "t_out": "guid-out",
                "t_supply": "guid-ahu",
                "ahu_fan": "guid-fan"
            }
        }
    }"#;

    #[test]
    fn test_parses_deployed_shape() {
        let config: Config = serde_json::from_str(DEPLOYED_SHAPE).unwrap();

        assert_eq!(config.scada.url, "https://scada.example.com");
        assert_eq!(config.scada.project_id, "plant-7");

        let zone = config.zone("office").unwrap();
        assert_eq!(zone.t_in, "guid-in");
        assert_eq!(zone.p_ahu, "guid-fan");
        assert_eq!(zone.variable_ids()[3], ("p_ahu", "guid-fan"));
    }

    #[test]
    fn test_serialized_keys_match_deployed_shape() {
        let config: Config = serde_json::from_str(DEPLOYED_SHAPE).unwrap();
        let out = serde_json::to_string_pretty(&config).unwrap();

        assert!(out.contains("\"scada_params\""));
        assert!(out.contains("\"variables\""));
        assert!(out.contains("\"t_supply\""));
        assert!(out.contains("\"ahu_fan\""));
    }

    #[test]
    fn test_unknown_zone() {
        let config = Config::default();
        let err = config.zone("basement").unwrap_err();
        assert_eq!(err.to_string(), "Unknown zone: basement");
    }

    #[test]
    fn test_default_config_is_empty() {
        let config = Config::default();
        assert!(config.zones.is_empty());
        assert!(config.scada.url.is_empty());
    }

    #[test]
    fn test_redacted_masks_password() {
        let mut config = Config::default();
        config.scada.password = "s3cret".to_string();

        let shown = config.redacted();
        assert_eq!(shown.scada.password, "********");
        assert_eq!(config.scada.password, "s3cret");
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let err = Config::load_from(Path::new("/nonexistent/window-detect/config.json"));
        assert!(matches!(err, Err(ConfigError::IoError(_))));
    }
}
