//! Signal conditioning for raw zone telemetry.
//!
//! Raw channels are irregularly sampled and full of gaps. Conditioning turns
//! them into a regular 1-minute frame the classifier can scan:
//! 1. Resample each channel to 1-minute mean aggregation; drop minutes with
//!    no data in any channel, then forward/backward-fill the remaining
//!    per-channel gaps on the surviving minutes.
//! 2. Reinstate the full minute grid and linearly interpolate interior gaps
//!    up to a per-channel limit. A gap longer than the limit stays entirely
//!    missing. The fan channel uses a wider limit than the temperatures.
//! 3. Localize the time axis to the configured civil timezone.
//! 4. Smooth `t_in` and `t_out` with a triangular-weighted moving average.
//! 5. Derive the difference channels the classifier thresholds on.

use crate::telemetry::{RawTelemetry, Sample};
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

/// Conditioning parameters.
#[derive(Debug, Clone)]
pub struct ConditioningConfig {
    /// Maximum interior gap (in minutes) bridged for temperature channels
    pub interpolation_limit: usize,
    /// Maximum interior gap (in minutes) bridged for the fan channel
    pub fan_interpolation_limit: usize,
    /// Moving-average window length in minutes
    pub smoothing_window: usize,
    /// Civil timezone of the zone; the classifier's hour gate is local time
    pub timezone: Tz,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            interpolation_limit: 10,
            fan_interpolation_limit: 30,
            smoothing_window: 10,
            timezone: chrono_tz::Europe::Prague,
        }
    }
}

/// The regularized, smoothed, derived-channel-augmented form of the raw
/// telemetry. All columns share the index; missing values are `None`.
#[derive(Debug, Clone, Default)]
pub struct ConditionedFrame {
    /// 1-minute time axis, localized
    pub index: Vec<DateTime<Tz>>,
    pub t_in: Vec<Option<f64>>,
    pub t_out: Vec<Option<f64>>,
    pub t_ahu: Vec<Option<f64>>,
    pub p_ahu: Vec<Option<f64>>,
    /// Triangular moving average of `t_in`
    pub t_in_ma: Vec<Option<f64>>,
    /// Triangular moving average of `t_out`
    pub t_out_ma: Vec<Option<f64>>,
    /// `t_in_ma - t_out_ma`: smoothed indoor/outdoor gap
    pub diff_tout: Vec<Option<f64>>,
    /// `t_in_ma - t_in`: instantaneous drop below the smoothed indoor baseline
    pub diff_tin: Vec<Option<f64>>,
    /// `t_ahu - t_in`: AHU supply vs indoor gap
    pub diff_tahu: Vec<Option<f64>>,
}

impl ConditionedFrame {
    /// Number of minutes in the frame.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Condition raw telemetry into a regular 1-minute frame.
///
/// An empty input yields an empty frame. A channel with no samples at all
/// stays entirely missing, which degrades the derived channels accordingly.
pub fn condition(raw: &RawTelemetry, config: &ConditioningConfig) -> ConditionedFrame {
    let Some((first, last)) = raw.span() else {
        return ConditionedFrame::default();
    };

    let start = minute_floor(first);
    let start_minute = start.timestamp().div_euclid(60);
    let len = ((minute_floor(last) - start).num_minutes() + 1) as usize;

    let mut t_in = resample_minutes(&raw.t_in, start_minute, len);
    let mut t_out = resample_minutes(&raw.t_out, start_minute, len);
    let mut t_ahu = resample_minutes(&raw.t_ahu, start_minute, len);
    let mut p_ahu = resample_minutes(&raw.p_ahu, start_minute, len);

    // Minutes where at least one channel reported survive the drop; the
    // fill below runs only along those minutes, so a full outage is not
    // extended by stale values.
    let keep: Vec<bool> = (0..len)
        .map(|i| {
            t_in[i].is_some() || t_out[i].is_some() || t_ahu[i].is_some() || p_ahu[i].is_some()
        })
        .collect();
    for column in [&mut t_in, &mut t_out, &mut t_ahu, &mut p_ahu] {
        fill_within_rows(column, &keep);
    }

    for column in [&mut t_in, &mut t_out, &mut t_ahu] {
        interpolate_gaps(column, config.interpolation_limit);
    }
    interpolate_gaps(&mut p_ahu, config.fan_interpolation_limit);

    let index: Vec<DateTime<Tz>> = (0..len)
        .map(|i| (start + Duration::minutes(i as i64)).with_timezone(&config.timezone))
        .collect();

    let t_in_ma = triangular_moving_average(&t_in, config.smoothing_window);
    let t_out_ma = triangular_moving_average(&t_out, config.smoothing_window);

    let diff_tout = subtract(&t_in_ma, &t_out_ma);
    let diff_tin = subtract(&t_in_ma, &t_in);
    let diff_tahu = subtract(&t_ahu, &t_in);

    ConditionedFrame {
        index,
        t_in,
        t_out,
        t_ahu,
        p_ahu,
        t_in_ma,
        t_out_ma,
        diff_tout,
        diff_tin,
        diff_tahu,
    }
}

// ============================================================================
// Conditioning steps
// ============================================================================

fn minute_floor(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts - Duration::seconds(ts.second() as i64) - Duration::nanoseconds(ts.nanosecond() as i64)
}

/// Mean-aggregate samples onto the minute grid starting at `start_minute`.
fn resample_minutes(samples: &[Sample], start_minute: i64, len: usize) -> Vec<Option<f64>> {
    let mut sums = vec![0.0; len];
    let mut counts = vec![0u32; len];
    for sample in samples {
        if !sample.value.is_finite() {
            continue;
        }
        let minute = sample.timestamp.timestamp().div_euclid(60) - start_minute;
        if minute < 0 || minute as usize >= len {
            continue;
        }
        sums[minute as usize] += sample.value;
        counts[minute as usize] += 1;
    }
    sums.iter()
        .zip(&counts)
        .map(|(&sum, &count)| {
            if count == 0 {
                None
            } else {
                Some(sum / count as f64)
            }
        })
        .collect()
}

/// Forward-fill then backward-fill a column, visiting only rows marked `keep`.
fn fill_within_rows(column: &mut [Option<f64>], keep: &[bool]) {
    let mut carried = None;
    for i in 0..column.len() {
        if !keep[i] {
            continue;
        }
        match column[i] {
            Some(v) => carried = Some(v),
            None => column[i] = carried,
        }
    }
    let mut carried = None;
    for i in (0..column.len()).rev() {
        if !keep[i] {
            continue;
        }
        match column[i] {
            Some(v) => carried = Some(v),
            None => column[i] = carried,
        }
    }
}

/// Linearly interpolate interior gaps of at most `limit` missing rows.
/// Longer gaps and edge gaps are left missing.
fn interpolate_gaps(column: &mut [Option<f64>], limit: usize) {
    let mut i = 0;
    while i < column.len() {
        if column[i].is_some() {
            i += 1;
            continue;
        }
        let gap_start = i;
        while i < column.len() && column[i].is_none() {
            i += 1;
        }
        let gap_end = i;
        if gap_start == 0 || gap_end == column.len() || gap_end - gap_start > limit {
            continue;
        }
        let (Some(left), Some(right)) = (column[gap_start - 1], column[gap_end]) else {
            continue;
        };
        let span = (gap_end - gap_start + 1) as f64;
        for (k, slot) in column[gap_start..gap_end].iter_mut().enumerate() {
            *slot = Some(left + (right - left) * (k + 1) as f64 / span);
        }
    }
}

/// Weights rising linearly to the window center and falling to the edges.
fn triangular_weights(window: usize) -> Vec<f64> {
    let mut weights = Vec::with_capacity(window);
    if window % 2 == 0 {
        let half = window / 2;
        for k in 0..half {
            weights.push((2 * k + 1) as f64 / window as f64);
        }
        for k in (0..half).rev() {
            weights.push((2 * k + 1) as f64 / window as f64);
        }
    } else {
        let half = window / 2 + 1;
        for k in 0..half {
            weights.push(2.0 * (k + 1) as f64 / (window + 1) as f64);
        }
        for k in (0..half - 1).rev() {
            weights.push(2.0 * (k + 1) as f64 / (window + 1) as f64);
        }
    }
    weights
}

/// Trailing triangular-weighted moving average. The first `window - 1`
/// outputs are missing, as is any output whose window touches a missing
/// value.
fn triangular_moving_average(column: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; column.len()];
    if window == 0 || column.len() < window {
        return out;
    }
    let weights = triangular_weights(window);
    let weight_sum: f64 = weights.iter().sum();
    for end in window..=column.len() {
        let mut acc = 0.0;
        let mut complete = true;
        for (weight, value) in weights.iter().zip(&column[end - window..end]) {
            match value {
                Some(v) => acc += weight * v,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            out[end - 1] = Some(acc / weight_sum);
        }
    }
    out
}

fn subtract(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(x - y),
            _ => None,
        })
        .collect()
}
