//! Window-open detection from indoor/outdoor temperature and AHU telemetry.
//!
//! This library turns raw zone telemetry into per-minute open/closed window
//! labels. A sudden indoor temperature dip against a colder outdoors, not
//! explained by the air handling unit, marks an opening; the label is held
//! until the room warms back to where it was.
//!
//! # Detection Approach
//!
//! - **Adaptive threshold**: the dip needed to open scales with the
//!   indoor/outdoor contrast, so cold days do not over-trigger
//! - **AHU awareness**: supply-air cold starts and freshly started fans are
//!   rejected as causes before a window is blamed
//! - **Hysteresis**: an opening is held for a minimum duration and closes
//!   only once the indoor temperature recovers past its opening value
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Window Detection                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌─────────────┐         │
//! │  │ Telemetry  │──▶│ Conditioning │──▶│  Detector   │         │
//! │  │(cache/net) │   │ (1-min frame)│   │ (hysteresis)│         │
//! │  └────────────┘   └──────────────┘   └─────────────┘         │
//! │        │                                     │               │
//! │        ▼                                     ▼               │
//! │  ┌────────────┐                      ┌─────────────┐         │
//! │  │   SCADA    │                      │   Report    │         │
//! │  │ (optional) │                      │ (json/csv)  │         │
//! │  └────────────┘                      └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use window_detect::core;
//! use window_detect::telemetry::{self, TelemetryCache};
//!
//! let cache = TelemetryCache::new(TelemetryCache::default_dir());
//! let from = Utc.with_ymd_and_hms(2019, 12, 1, 0, 0, 0).unwrap();
//! let to = Utc.with_ymd_and_hms(2019, 12, 30, 0, 0, 0).unwrap();
//!
//! let raw = telemetry::load_cached(&cache, "class_01", from, to).expect("no cached telemetry");
//! let frame = core::condition(&raw, &core::ConditioningConfig::default());
//! let labels = core::classify(&frame, &core::DetectorConfig::default());
//!
//! let report = core::DetectionReport::build("class_01", &frame, &labels);
//! println!("{}", report.to_json());
//! ```

pub mod config;
pub mod core;
pub mod scada;
pub mod telemetry;

// Re-export key types at crate root for convenience
pub use config::{Config, ScadaParams, ZoneConfig};
pub use core::{
    classify, condition, ConditionedFrame, ConditioningConfig, DetectionReport, DetectorConfig,
    WindowDetector, WindowState,
};
pub use telemetry::{RawTelemetry, Sample, TelemetryCache, TelemetryError};

// SCADA client re-exports (when enabled)
#[cfg(feature = "scada")]
pub use scada::{BlockingScadaClient, ScadaClient, ScadaError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
