//! Demonstration of the window detection pipeline on synthetic telemetry.
//!
//! This example shows how to:
//! 1. Build raw per-channel zone telemetry
//! 2. Condition it into a regular one-minute frame
//! 3. Run the open-window classifier
//! 4. Assemble and render a detection report
//!
//! Run with: cargo run --example detect_demo

use chrono::{Duration, TimeZone, Utc};
use window_detect::core::{
    classify, condition, ConditioningConfig, DetectionReport, DetectorConfig,
};
use window_detect::telemetry::{RawTelemetry, Sample};

fn main() {
    println!("Window Detect - Detection Demo");
    println!("==============================");
    println!();

    // Synthesize two hours of telemetry: a steady 22 °C room against a 10 °C
    // morning, with a sharp indoor dip at 10:00 local time
    let start = Utc.with_ymd_and_hms(2019, 12, 10, 8, 0, 0).unwrap();
    let mut telemetry = RawTelemetry::default();

    for i in 0..120i64 {
        let at = start + Duration::minutes(i);
        let t_in = match i {
            60 => 20.0,
            61 => 18.0,
            62 => 21.9,
            _ => 22.0,
        };

        telemetry.t_in.push(Sample::new(at, t_in));
        telemetry.t_out.push(Sample::new(at, 10.0));
        telemetry.t_ahu.push(Sample::new(at, 22.0));
        telemetry.p_ahu.push(Sample::new(at, 0.0));
    }

    println!(
        "Synthesized {} samples across 4 channels.",
        telemetry.sample_count()
    );

    // Condition into a one-minute localized frame
    let frame = condition(&telemetry, &ConditioningConfig::default());
    println!("Conditioned frame: {} minutes.", frame.len());

    // Label every minute
    let labels = classify(&frame, &DetectorConfig::default());
    let report = DetectionReport::build("demo_zone", &frame, &labels);

    println!();
    println!("=== Detection Result ===");
    println!("  Minutes analyzed: {}", report.minutes_analyzed);
    println!("  Minutes open: {}", report.minutes_open);
    println!();

    if report.open_intervals.is_empty() {
        println!("  No open windows detected.");
    } else {
        for interval in &report.open_intervals {
            println!(
                "  Open: {} .. {} ({} min)",
                interval.start, interval.end, interval.minutes
            );
        }
    }
    println!();

    // Show snippet of the report JSON
    let json = report.to_json();
    println!("  Report (truncated):");
    for line in json.lines().take(15) {
        println!("    {line}");
    }
    println!("    ...");
    println!();
    println!("Demo complete!");
}
