//! Telemetry acquisition for window detection.
//!
//! Detection runs read from the local JSON cache by default. With the `scada`
//! feature enabled, telemetry can instead be refreshed from the remote SCADA
//! history endpoint, which writes the fetched data through the cache before
//! the run proceeds.

pub mod cache;
pub mod types;

// Re-export commonly used types
pub use cache::TelemetryCache;
pub use types::{RawTelemetry, Sample};

use chrono::{DateTime, Utc};

#[cfg(feature = "scada")]
use crate::config::{ScadaParams, ZoneConfig};
#[cfg(feature = "scada")]
use crate::scada::BlockingScadaClient;

/// Telemetry acquisition errors.
#[derive(Debug)]
pub enum TelemetryError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    /// No cached telemetry exists for the requested zone
    CacheMiss(String),
    /// Remote fetch failed
    #[cfg(feature = "scada")]
    Scada(crate::scada::ScadaError),
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryError::IoError(e) => write!(f, "IO error: {e}"),
            TelemetryError::ParseError(e) => write!(f, "Parse error: {e}"),
            TelemetryError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            TelemetryError::CacheMiss(e) => write!(f, "Cache miss: {e}"),
            #[cfg(feature = "scada")]
            TelemetryError::Scada(e) => write!(f, "SCADA error: {e}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

/// Load cached telemetry for a zone, normalized and clamped to `[from, to]`.
pub fn load_cached(
    cache: &TelemetryCache,
    zone: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<RawTelemetry, TelemetryError> {
    let mut telemetry = cache.load(zone)?;
    telemetry.normalize();
    telemetry.clamp_range(from, to);
    Ok(telemetry)
}

/// Fetch fresh telemetry from the SCADA endpoint, write it through the cache,
/// and return it normalized and clamped to `[from, to]`.
#[cfg(feature = "scada")]
pub fn refresh_from_scada(
    cache: &TelemetryCache,
    zone: &str,
    channels: &ZoneConfig,
    params: &ScadaParams,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<RawTelemetry, TelemetryError> {
    let client = BlockingScadaClient::new(params.clone()).map_err(TelemetryError::Scada)?;
    let mut telemetry = client
        .get_history(channels, from, to)
        .map_err(TelemetryError::Scada)?;

    telemetry.normalize();
    cache.store(zone, &telemetry)?;

    telemetry.clamp_range(from, to);
    Ok(telemetry)
}
