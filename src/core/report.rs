//! Detection report assembly.
//!
//! Flattens a conditioned frame plus its label series into the table an
//! external renderer consumes, and derives the open intervals and run totals
//! shown by the CLI. Numeric columns are rounded to two decimals; timestamps
//! are RFC 3339 in the frame's local timezone.

use crate::core::conditioning::ConditionedFrame;
use crate::core::detector::WindowState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One rendered minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub timestamp: String,
    pub t_in: Option<f64>,
    pub t_out: Option<f64>,
    pub t_ahu: Option<f64>,
    pub p_ahu: Option<f64>,
    pub window_open: u8,
}

/// Maximal run of open-labeled minutes. `end` is the last open minute, not
/// the minute that closed the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInterval {
    pub start: String,
    pub end: String,
    pub minutes: usize,
}

/// Full output of one detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub run_id: String,
    pub zone: String,
    pub producer: String,
    pub generated_at: DateTime<Utc>,
    pub minutes_analyzed: usize,
    pub minutes_open: usize,
    pub open_intervals: Vec<OpenInterval>,
    pub rows: Vec<ReportRow>,
}

impl DetectionReport {
    /// Assemble a report from a conditioned frame and its labels.
    ///
    /// Extra trailing entries on either side are ignored when the lengths
    /// disagree.
    pub fn build(zone: &str, frame: &ConditionedFrame, labels: &[WindowState]) -> Self {
        let n = frame.len().min(labels.len());

        let mut rows = Vec::with_capacity(n);
        for i in 0..n {
            rows.push(ReportRow {
                timestamp: frame.index[i].to_rfc3339(),
                t_in: round2(frame.t_in[i]),
                t_out: round2(frame.t_out[i]),
                t_ahu: round2(frame.t_ahu[i]),
                p_ahu: round2(frame.p_ahu[i]),
                window_open: labels[i].as_u8(),
            });
        }

        Self {
            run_id: Uuid::new_v4().to_string(),
            zone: zone.to_string(),
            producer: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            generated_at: Utc::now(),
            minutes_analyzed: n,
            minutes_open: labels[..n].iter().filter(|l| l.is_open()).count(),
            open_intervals: open_runs(frame, labels, n),
            rows,
        }
    }

    /// Pretty JSON for file output.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Row table as CSV. Missing values render as empty cells.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("timestamp,t_in,t_out,t_ahu,p_ahu,window_open\n");
        for row in &self.rows {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                row.timestamp,
                csv_cell(row.t_in),
                csv_cell(row.t_out),
                csv_cell(row.t_ahu),
                csv_cell(row.p_ahu),
                row.window_open
            ));
        }
        out
    }
}

fn round2(value: Option<f64>) -> Option<f64> {
    value.map(|v| (v * 100.0).round() / 100.0)
}

fn csv_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn open_runs(frame: &ConditionedFrame, labels: &[WindowState], n: usize) -> Vec<OpenInterval> {
    let mut intervals = Vec::new();
    let mut run_start: Option<usize> = None;

    for i in 0..n {
        match (labels[i].is_open(), run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                intervals.push(OpenInterval {
                    start: frame.index[start].to_rfc3339(),
                    end: frame.index[i - 1].to_rfc3339(),
                    minutes: i - start,
                });
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        intervals.push(OpenInterval {
            start: frame.index[start].to_rfc3339(),
            end: frame.index[n - 1].to_rfc3339(),
            minutes: n - start,
        });
    }

    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Europe::Prague;

    fn winter_frame(t_in: Vec<Option<f64>>) -> ConditionedFrame {
        let start = Prague.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let n = t_in.len();
        let mut frame = ConditionedFrame::default();
        frame.index = (0..n as i64).map(|i| start + Duration::minutes(i)).collect();
        frame.t_in = t_in;
        frame.t_out = vec![Some(10.0); n];
        frame.t_ahu = vec![Some(18.0); n];
        frame.p_ahu = vec![Some(0.0); n];
        frame
    }

    #[test]
    fn test_rows_round_to_two_decimals() {
        let frame = winter_frame(vec![Some(21.957), None]);
        let labels = vec![WindowState::Open, WindowState::Closed];
        let report = DetectionReport::build("office", &frame, &labels);

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].timestamp, "2024-01-15T10:00:00+01:00");
        assert_eq!(report.rows[0].t_in, Some(21.96));
        assert_eq!(report.rows[0].window_open, 1);
        assert_eq!(report.rows[1].t_in, None);
        assert_eq!(report.rows[1].window_open, 0);
    }

    #[test]
    fn test_open_intervals_and_totals() {
        let frame = winter_frame(vec![Some(22.0); 5]);
        let labels = vec![
            WindowState::Closed,
            WindowState::Open,
            WindowState::Open,
            WindowState::Closed,
            WindowState::Open,
        ];
        let report = DetectionReport::build("office", &frame, &labels);

        assert_eq!(report.minutes_analyzed, 5);
        assert_eq!(report.minutes_open, 3);
        assert_eq!(report.open_intervals.len(), 2);

        let first = &report.open_intervals[0];
        assert_eq!(first.start, "2024-01-15T10:01:00+01:00");
        assert_eq!(first.end, "2024-01-15T10:02:00+01:00");
        assert_eq!(first.minutes, 2);

        // open run still active at the end of the frame
        let second = &report.open_intervals[1];
        assert_eq!(second.start, "2024-01-15T10:04:00+01:00");
        assert_eq!(second.end, "2024-01-15T10:04:00+01:00");
        assert_eq!(second.minutes, 1);
    }

    #[test]
    fn test_csv_renders_missing_as_empty() {
        let mut frame = winter_frame(vec![Some(22.0)]);
        frame.p_ahu[0] = None;
        let report = DetectionReport::build("office", &frame, &[WindowState::Closed]);

        let csv = report.to_csv();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,t_in,t_out,t_ahu,p_ahu,window_open")
        );
        assert_eq!(lines.next(), Some("2024-01-15T10:00:00+01:00,22,10,18,,0"));
    }

    #[test]
    fn test_json_carries_run_metadata() {
        let frame = winter_frame(vec![Some(22.0)]);
        let report = DetectionReport::build("office", &frame, &[WindowState::Closed]);

        assert_eq!(report.run_id.len(), 36);
        assert!(report.producer.starts_with("window-detect"));

        let json = report.to_json();
        assert!(json.contains("\"run_id\""));
        assert!(json.contains("\"zone\": \"office\""));
        assert!(json.contains("\"minutes_analyzed\": 1"));
    }

    #[test]
    fn test_length_mismatch_truncates() {
        let frame = winter_frame(vec![Some(22.0); 5]);
        let labels = vec![WindowState::Open; 3];
        let report = DetectionReport::build("office", &frame, &labels);

        assert_eq!(report.minutes_analyzed, 3);
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.open_intervals[0].minutes, 3);
    }
}
