//! Local JSON cache for zone telemetry.
//!
//! One JSON document per zone. The cache is the default data source for
//! detection runs; a refresh from SCADA writes through it.

use crate::telemetry::types::RawTelemetry;
use crate::telemetry::TelemetryError;
use std::path::PathBuf;

/// Per-zone telemetry store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct TelemetryCache {
    dir: PathBuf,
}

impl TelemetryCache {
    /// Create a cache over the given directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default cache directory under the platform's local data dir.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("window-detect")
            .join("telemetry")
    }

    /// Path of the cache file for a zone.
    pub fn path_for(&self, zone: &str) -> PathBuf {
        self.dir.join(format!("{zone}.json"))
    }

    /// Check whether cached telemetry exists for a zone.
    pub fn contains(&self, zone: &str) -> bool {
        self.path_for(zone).exists()
    }

    /// Load cached telemetry for a zone.
    pub fn load(&self, zone: &str) -> Result<RawTelemetry, TelemetryError> {
        let path = self.path_for(zone);
        if !path.exists() {
            return Err(TelemetryError::CacheMiss(format!(
                "no cached telemetry for zone '{zone}' at {path:?}"
            )));
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| TelemetryError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| TelemetryError::ParseError(e.to_string()))
    }

    /// Store telemetry for a zone, creating the cache directory if needed.
    pub fn store(&self, zone: &str, telemetry: &RawTelemetry) -> Result<(), TelemetryError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| TelemetryError::IoError(e.to_string()))?;

        let content = serde_json::to_string_pretty(telemetry)
            .map_err(|e| TelemetryError::SerializeError(e.to_string()))?;

        std::fs::write(self.path_for(zone), content)
            .map_err(|e| TelemetryError::IoError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::types::Sample;
    use chrono::{TimeZone, Utc};

    fn temp_cache() -> TelemetryCache {
        let dir = std::env::temp_dir().join(format!("window-detect-test-{}", uuid::Uuid::new_v4()));
        TelemetryCache::new(dir)
    }

    #[test]
    fn test_store_load_roundtrip() {
        let cache = temp_cache();
        let telemetry = RawTelemetry {
            t_in: vec![Sample::new(
                Utc.with_ymd_and_hms(2019, 12, 1, 10, 0, 0).unwrap(),
                21.5,
            )],
            ..Default::default()
        };

        cache.store("class_01", &telemetry).unwrap();
        assert!(cache.contains("class_01"));

        let loaded = cache.load("class_01").unwrap();
        assert_eq!(loaded.t_in.len(), 1);
        assert_eq!(loaded.t_in[0].value, 21.5);
        assert_eq!(loaded.t_in[0].timestamp, telemetry.t_in[0].timestamp);

        let _ = std::fs::remove_dir_all(cache.path_for("class_01").parent().unwrap());
    }

    #[test]
    fn test_load_missing_zone_is_cache_miss() {
        let cache = temp_cache();
        let err = cache.load("nowhere").unwrap_err();
        assert!(matches!(err, TelemetryError::CacheMiss(_)));
        assert!(err.to_string().contains("nowhere"));
    }
}
