//! Open-window classifier.
//!
//! A single forward pass over the conditioned frame. Each minute is labeled
//! open or closed from a handful of carried counters, with hysteresis so the
//! label does not flicker: opening requires a dip below a dynamic threshold
//! plus several guard conditions, closing requires the indoor temperature to
//! recover past the value recorded at opening and a minimum open duration.
//!
//! Rule order within one minute matters and is fixed:
//! 1. Update the AHU running/idle streaks from the fan channel.
//! 2. If open, check the closing condition; the minute that closes is itself
//!    labeled closed.
//! 3. A missing supply-air gap never blocks an opening; a missing smoothed
//!    indoor/outdoor gap skips opening detection for the minute.
//! 4. Interpolate the opening threshold from the indoor/outdoor gap.
//! 5. If closed, test the full opening conjunction.
//! 6. A minute that ends up open advances the open-duration counter.

use crate::core::conditioning::ConditionedFrame;
use crate::core::threshold::PiecewiseLinear;
use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Per-minute label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    Closed,
    Open,
}

impl WindowState {
    pub fn is_open(self) -> bool {
        self == WindowState::Open
    }

    /// 0 for closed, 1 for open.
    pub fn as_u8(self) -> u8 {
        match self {
            WindowState::Closed => 0,
            WindowState::Open => 1,
        }
    }
}

/// Classifier tuning. Defaults are the hand-tuned production values.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum open duration (minutes) before the closing check may close
    pub min_open_minutes: u32,
    /// AHU running streak (minutes) above which its influence counts as stable
    pub min_ahu_running_streak: u32,
    /// Minimum smoothed indoor/outdoor gap (°C) for an opening candidate
    pub min_outdoor_gap: f64,
    /// Indoor recovery past the opening temperature (°C) that allows closing
    pub closing_margin: f64,
    /// Supply-air gap (°C) below which a dip is blamed on an AHU cold start
    pub ahu_cold_start_margin: f64,
    /// First local hour (inclusive) at which openings are considered
    pub day_start_hour: u32,
    /// Last local hour (inclusive) at which openings are considered
    pub day_end_hour: u32,
    /// Opening threshold as a function of the smoothed indoor/outdoor gap
    pub opening_threshold: PiecewiseLinear,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_open_minutes: 10,
            min_ahu_running_streak: 20,
            min_outdoor_gap: 3.0,
            closing_margin: -0.5,
            ahu_cold_start_margin: -1.0,
            day_start_hour: 6,
            day_end_hour: 20,
            opening_threshold: PiecewiseLinear::new(vec![
                (3.0, 0.3),
                (8.0, 0.4),
                (10.0, 0.5),
                (12.0, 0.7),
            ]),
        }
    }
}

/// Carried classifier state. One instance per run, discarded afterwards.
#[derive(Debug, Clone, Default)]
pub struct DetectionState {
    /// Consecutive minutes currently labeled open; 0 means closed
    pub open_minutes: u32,
    /// Indoor temperature recorded at the opening minute; `Some` while open
    pub t_in_at_open: Option<f64>,
    /// Consecutive minutes with the fan reporting power
    pub ahu_running_streak: u32,
    /// Consecutive minutes with the fan idle or unreported
    pub ahu_idle_streak: u32,
}

/// One minute of classifier input, already localized.
#[derive(Debug, Clone, Copy)]
pub struct TickSignals {
    /// Local hour of day
    pub hour: u32,
    pub t_in: Option<f64>,
    pub p_ahu: Option<f64>,
    pub diff_tin: Option<f64>,
    pub diff_tout: Option<f64>,
    pub diff_tahu: Option<f64>,
}

/// Stateful open-window detector.
pub struct WindowDetector {
    config: DetectorConfig,
    state: DetectionState,
}

impl WindowDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            state: DetectionState::default(),
        }
    }

    /// Current carried state.
    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    /// Forget all carried state.
    pub fn reset(&mut self) {
        self.state = DetectionState::default();
    }

    /// Process one minute and return its label.
    pub fn process_tick(&mut self, tick: &TickSignals) -> WindowState {
        // 1. AHU streaks; a missing fan reading counts as idle
        if tick.p_ahu.map_or(false, |p| p > 0.0) {
            self.state.ahu_running_streak += 1;
            self.state.ahu_idle_streak = 0;
        } else {
            self.state.ahu_running_streak = 0;
            self.state.ahu_idle_streak += 1;
        }

        let mut label = WindowState::Closed;

        // 2. Closing check; a missing indoor reading never closes
        if self.state.open_minutes > 0 {
            let recovered = match (tick.t_in, self.state.t_in_at_open) {
                (Some(t_in), Some(t_ref)) => t_in - t_ref > self.config.closing_margin,
                _ => false,
            };
            if recovered && self.state.open_minutes >= self.config.min_open_minutes {
                self.state.open_minutes = 0;
                self.state.t_in_at_open = None;
            } else {
                label = WindowState::Open;
            }
        }

        // 3.-5. Opening detection. Without the smoothed indoor/outdoor gap
        // there is no threshold to evaluate, so the minute cannot open.
        if let Some(diff_tout) = tick.diff_tout {
            if self.state.open_minutes == 0 {
                let t_th = self.config.opening_threshold.value_at(diff_tout);
                let dipped = tick.diff_tin.map_or(false, |d| d > t_th);
                let contrast = diff_tout > self.config.min_outdoor_gap;
                let no_cold_start = tick
                    .diff_tahu
                    .map_or(true, |d| d > self.config.ahu_cold_start_margin);
                let daytime =
                    tick.hour >= self.config.day_start_hour && tick.hour <= self.config.day_end_hour;
                let ahu_stable = self.state.ahu_running_streak > self.config.min_ahu_running_streak
                    || self.state.ahu_running_streak == 0;

                if dipped && contrast && no_cold_start && daytime && ahu_stable {
                    label = WindowState::Open;
                    self.state.t_in_at_open = tick.t_in;
                }
            }
        }

        // 6. Open-duration bookkeeping
        if label.is_open() {
            self.state.open_minutes += 1;
        }

        label
    }
}

/// Label every minute of a conditioned frame.
///
/// An empty frame yields an empty label series; the classifier itself never
/// fails.
pub fn classify(frame: &ConditionedFrame, config: &DetectorConfig) -> Vec<WindowState> {
    let mut detector = WindowDetector::new(config.clone());
    (0..frame.len())
        .map(|i| {
            let tick = TickSignals {
                hour: frame.index[i].hour(),
                t_in: frame.t_in[i],
                p_ahu: frame.p_ahu[i],
                diff_tin: frame.diff_tin[i],
                diff_tout: frame.diff_tout[i],
                diff_tahu: frame.diff_tahu[i],
            };
            detector.process_tick(&tick)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tick with a qualifying dip: AHU off, supply-air gap unreported.
    fn dip_tick(hour: u32) -> TickSignals {
        TickSignals {
            hour,
            t_in: Some(20.0),
            p_ahu: Some(0.0),
            diff_tin: Some(2.0),
            diff_tout: Some(11.0),
            diff_tahu: None,
        }
    }

    /// Tick with no dip, window shape otherwise identical.
    fn calm_tick(t_in: f64) -> TickSignals {
        TickSignals {
            hour: 10,
            t_in: Some(t_in),
            p_ahu: Some(0.0),
            diff_tin: Some(0.0),
            diff_tout: Some(11.0),
            diff_tahu: None,
        }
    }

    fn detector() -> WindowDetector {
        WindowDetector::new(DetectorConfig::default())
    }

    #[test]
    fn test_opens_on_full_conjunction() {
        let mut det = detector();
        let label = det.process_tick(&dip_tick(10));

        assert_eq!(label, WindowState::Open);
        assert_eq!(det.state().open_minutes, 1);
        assert_eq!(det.state().t_in_at_open, Some(20.0));
    }

    #[test]
    fn test_hour_gate_is_inclusive() {
        assert_eq!(detector().process_tick(&dip_tick(6)), WindowState::Open);
        assert_eq!(detector().process_tick(&dip_tick(20)), WindowState::Open);
        assert_eq!(detector().process_tick(&dip_tick(5)), WindowState::Closed);
        assert_eq!(detector().process_tick(&dip_tick(21)), WindowState::Closed);
    }

    #[test]
    fn test_outdoor_gap_must_exceed_minimum() {
        let mut tick = dip_tick(10);
        tick.diff_tout = Some(3.0);
        assert_eq!(detector().process_tick(&tick), WindowState::Closed);

        tick.diff_tout = Some(3.1);
        assert_eq!(detector().process_tick(&tick), WindowState::Open);
    }

    #[test]
    fn test_dip_must_exceed_dynamic_threshold() {
        // diff_tout of 12 raises the threshold to 0.7
        let mut tick = dip_tick(10);
        tick.diff_tout = Some(12.0);
        tick.diff_tin = Some(0.65);
        assert_eq!(detector().process_tick(&tick), WindowState::Closed);

        tick.diff_tin = Some(0.75);
        assert_eq!(detector().process_tick(&tick), WindowState::Open);
    }

    #[test]
    fn test_cold_start_margin_blocks_strictly() {
        let mut tick = dip_tick(10);
        tick.diff_tahu = Some(-1.0);
        assert_eq!(detector().process_tick(&tick), WindowState::Closed);

        tick.diff_tahu = Some(-0.9);
        assert_eq!(detector().process_tick(&tick), WindowState::Open);

        tick.diff_tahu = None;
        assert_eq!(detector().process_tick(&tick), WindowState::Open);
    }

    #[test]
    fn test_short_ahu_running_streak_suppresses() {
        let mut det = detector();
        let mut running = calm_tick(22.0);
        running.p_ahu = Some(1.0);

        for _ in 0..5 {
            det.process_tick(&running);
        }
        assert_eq!(det.state().ahu_running_streak, 5);

        let mut dip = dip_tick(10);
        dip.p_ahu = Some(1.0);
        assert_eq!(det.process_tick(&dip), WindowState::Closed);
    }

    #[test]
    fn test_long_ahu_running_streak_allows_opening() {
        let mut det = detector();
        let mut running = calm_tick(22.0);
        running.p_ahu = Some(1.0);

        for _ in 0..21 {
            det.process_tick(&running);
        }

        let mut dip = dip_tick(10);
        dip.p_ahu = Some(1.0);
        // Streak becomes 22 on this tick, past the stability minimum
        assert_eq!(det.process_tick(&dip), WindowState::Open);
    }

    #[test]
    fn test_missing_fan_reading_counts_as_idle() {
        let mut det = detector();
        let mut tick = calm_tick(22.0);
        tick.p_ahu = None;
        det.process_tick(&tick);

        assert_eq!(det.state().ahu_running_streak, 0);
        assert_eq!(det.state().ahu_idle_streak, 1);
    }

    #[test]
    fn test_minimum_hold_then_close_on_recovery() {
        let mut det = detector();
        assert_eq!(det.process_tick(&dip_tick(10)), WindowState::Open);

        // Indoor temperature recovers immediately, but the hold keeps the
        // window open until the minimum duration passes
        let mut labels = Vec::new();
        for _ in 0..9 {
            labels.push(det.process_tick(&calm_tick(22.0)));
        }
        assert!(labels.iter().all(|l| l.is_open()));
        assert_eq!(det.state().open_minutes, 10);

        // Eleventh minute satisfies both the recovery and the hold
        assert_eq!(det.process_tick(&calm_tick(22.0)), WindowState::Closed);
        assert_eq!(det.state().open_minutes, 0);
        assert_eq!(det.state().t_in_at_open, None);
    }

    #[test]
    fn test_closing_margin_is_strict() {
        let mut det = detector();
        det.process_tick(&dip_tick(10));

        // Exactly at the margin: 19.5 - 20.0 == -0.5, not past it
        for _ in 0..15 {
            assert_eq!(det.process_tick(&calm_tick(19.5)), WindowState::Open);
        }
        assert_eq!(det.process_tick(&calm_tick(19.6)), WindowState::Closed);
    }

    #[test]
    fn test_missing_indoor_reading_never_closes() {
        let mut det = detector();
        det.process_tick(&dip_tick(10));

        let mut blind = calm_tick(22.0);
        blind.t_in = None;
        for _ in 0..20 {
            assert_eq!(det.process_tick(&blind), WindowState::Open);
        }
    }

    #[test]
    fn test_missing_outdoor_gap_keeps_open_counting() {
        let mut det = detector();
        det.process_tick(&dip_tick(10));

        let mut blind = calm_tick(19.0);
        blind.diff_tout = None;
        assert_eq!(det.process_tick(&blind), WindowState::Open);
        assert_eq!(det.state().open_minutes, 2);
    }

    #[test]
    fn test_missing_outdoor_gap_cannot_open() {
        let mut tick = dip_tick(10);
        tick.diff_tout = None;
        let mut det = detector();
        assert_eq!(det.process_tick(&tick), WindowState::Closed);
        assert_eq!(det.state().open_minutes, 0);
    }

    #[test]
    fn test_reopens_same_minute_when_dip_persists() {
        let mut det = detector();
        det.process_tick(&dip_tick(10));
        for _ in 0..10 {
            det.process_tick(&calm_tick(19.0));
        }

        // Indoor temperature is back above the opening value, yet still far
        // below its moving average: the closing check fires first, then the
        // opening test re-qualifies within the same minute
        let mut tick = dip_tick(10);
        tick.t_in = Some(21.0);
        assert_eq!(det.process_tick(&tick), WindowState::Open);
        assert_eq!(det.state().open_minutes, 1);
        assert_eq!(det.state().t_in_at_open, Some(21.0));
    }

    #[test]
    fn test_labels_map_to_binary() {
        assert_eq!(WindowState::Closed.as_u8(), 0);
        assert_eq!(WindowState::Open.as_u8(), 1);
        assert!(!WindowState::Closed.is_open());
        assert!(WindowState::Open.is_open());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut det = detector();
        det.process_tick(&dip_tick(10));
        det.reset();

        assert_eq!(det.state().open_minutes, 0);
        assert_eq!(det.state().t_in_at_open, None);
        assert_eq!(det.state().ahu_idle_streak, 0);
    }
}
