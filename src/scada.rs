//! SCADA history client for fetching zone telemetry.
//!
//! The HTTP client itself is compiled only with the `scada` feature; the
//! request/response wire types and the response-to-telemetry assembly are
//! always available.

use crate::config::ZoneConfig;
use crate::telemetry::{RawTelemetry, Sample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "scada")]
use crate::config::ScadaParams;

/// History endpoint for a SCADA base URL. Trailing slashes are tolerated.
pub fn history_url(base: &str) -> String {
    format!("{}/api/history", base.trim_end_matches('/'))
}

/// History query payload.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRequest {
    pub project_id: String,
    pub variable_ids: Vec<String>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Per-variable history as returned by the server, keyed by variable id.
pub type HistoryResponse = HashMap<String, VariableHistory>;

/// History of one variable. The server nests the series under `raw`.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableHistory {
    pub raw: RawSeries,
}

/// Parallel timestamp and value arrays; `null` marks a missing reading.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSeries {
    pub tx_dt: Vec<DateTime<Utc>>,
    pub values: Vec<Option<f64>>,
}

/// SCADA client error types.
#[derive(Debug)]
pub enum ScadaError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for ScadaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScadaError::Config(msg) => write!(f, "SCADA config error: {msg}"),
            ScadaError::Network(msg) => write!(f, "SCADA network error: {msg}"),
            ScadaError::Server { status, message } => {
                write!(f, "SCADA server error ({status}): {message}")
            }
            ScadaError::Serialization(msg) => write!(f, "SCADA serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ScadaError {}

/// Samples for one variable id. An id absent from the response yields an
/// empty channel; null values are dropped.
pub fn channel_samples(response: &HistoryResponse, variable_id: &str) -> Vec<Sample> {
    let Some(history) = response.get(variable_id) else {
        return Vec::new();
    };

    history
        .raw
        .tx_dt
        .iter()
        .zip(history.raw.values.iter())
        .filter_map(|(timestamp, value)| value.map(|v| Sample::new(*timestamp, v)))
        .collect()
}

/// Map a history response onto a zone's four telemetry channels.
pub fn assemble(response: &HistoryResponse, zone: &ZoneConfig) -> RawTelemetry {
    RawTelemetry {
        t_in: channel_samples(response, &zone.t_in),
        t_out: channel_samples(response, &zone.t_out),
        t_ahu: channel_samples(response, &zone.t_ahu),
        p_ahu: channel_samples(response, &zone.p_ahu),
    }
}

/// SCADA history client.
#[cfg(feature = "scada")]
pub struct ScadaClient {
    params: ScadaParams,
    client: reqwest::Client,
}

#[cfg(feature = "scada")]
impl ScadaClient {
    /// Create a new SCADA client.
    pub fn new(params: ScadaParams) -> Result<Self, ScadaError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ScadaError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { params, client })
    }

    /// Fetch the history of a zone's four channels over `[from, to]`.
    pub async fn get_history(
        &self,
        zone: &ZoneConfig,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RawTelemetry, ScadaError> {
        let request = HistoryRequest {
            project_id: self.params.project_id.clone(),
            variable_ids: zone
                .variable_ids()
                .iter()
                .map(|(_, id)| id.to_string())
                .collect(),
            from,
            to,
        };

        let response = self
            .client
            .post(history_url(&self.params.url))
            .basic_auth(&self.params.username, Some(&self.params.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| ScadaError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ScadaError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let history: HistoryResponse = response
            .json()
            .await
            .map_err(|e| ScadaError::Serialization(e.to_string()))?;

        Ok(assemble(&history, zone))
    }
}

/// Blocking SCADA client for use in synchronous contexts.
#[cfg(feature = "scada")]
pub struct BlockingScadaClient {
    inner: ScadaClient,
    runtime: tokio::runtime::Runtime,
}

#[cfg(feature = "scada")]
impl BlockingScadaClient {
    /// Create a new blocking SCADA client.
    pub fn new(params: ScadaParams) -> Result<Self, ScadaError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ScadaError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: ScadaClient::new(params)?,
            runtime,
        })
    }

    /// Fetch the history of a zone's four channels over `[from, to]`.
    pub fn get_history(
        &self,
        zone: &ZoneConfig,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RawTelemetry, ScadaError> {
        self.runtime.block_on(self.inner.get_history(zone, from, to))
    }
}
