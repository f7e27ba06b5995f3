//! Raw telemetry types for zone channels.
//!
//! A zone is observed through four channels: indoor temperature, outdoor
//! temperature, AHU supply-air temperature, and AHU fan power. Each channel
//! arrives as irregularly spaced (timestamp, value) samples.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A single reading from one telemetry channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp of the reading (UTC)
    pub timestamp: DateTime<Utc>,
    /// Measured value
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Raw per-channel telemetry for one zone over one time range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTelemetry {
    /// Indoor temperature samples (°C)
    pub t_in: Vec<Sample>,
    /// Outdoor temperature samples (°C)
    pub t_out: Vec<Sample>,
    /// AHU supply-air temperature samples (°C)
    pub t_ahu: Vec<Sample>,
    /// AHU fan power samples (>0 means running)
    pub p_ahu: Vec<Sample>,
}

impl RawTelemetry {
    /// Check whether no channel has any sample.
    pub fn is_empty(&self) -> bool {
        self.t_in.is_empty() && self.t_out.is_empty() && self.t_ahu.is_empty() && self.p_ahu.is_empty()
    }

    /// Total number of samples across all channels.
    pub fn sample_count(&self) -> usize {
        self.t_in.len() + self.t_out.len() + self.t_ahu.len() + self.p_ahu.len()
    }

    /// Normalize every channel: drop sub-second precision, sort by timestamp,
    /// and de-duplicate timestamps keeping the first sample.
    pub fn normalize(&mut self) {
        for channel in self.channels_mut() {
            normalize_channel(channel);
        }
    }

    /// Keep only samples inside `[from, to]` (both ends inclusive).
    pub fn clamp_range(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) {
        for channel in self.channels_mut() {
            channel.retain(|s| s.timestamp >= from && s.timestamp <= to);
        }
    }

    /// Earliest and latest timestamp across all channels, if any sample exists.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut span: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for channel in [&self.t_in, &self.t_out, &self.t_ahu, &self.p_ahu] {
            for sample in channel {
                span = match span {
                    None => Some((sample.timestamp, sample.timestamp)),
                    Some((first, last)) => Some((
                        first.min(sample.timestamp),
                        last.max(sample.timestamp),
                    )),
                };
            }
        }
        span
    }

    fn channels_mut(&mut self) -> [&mut Vec<Sample>; 4] {
        [
            &mut self.t_in,
            &mut self.t_out,
            &mut self.t_ahu,
            &mut self.p_ahu,
        ]
    }
}

fn normalize_channel(samples: &mut Vec<Sample>) {
    for sample in samples.iter_mut() {
        if let Some(truncated) = sample.timestamp.with_nanosecond(0) {
            sample.timestamp = truncated;
        }
    }
    samples.sort_by_key(|s| s.timestamp);
    samples.dedup_by_key(|s| s.timestamp);
}
