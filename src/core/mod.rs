//! Core functionality for the window detection pipeline.
//!
//! This module contains:
//! - Signal conditioning from raw telemetry to a regular minute frame
//! - The open-window classifier run over the conditioned frame
//! - Report assembly for renderers and the CLI

pub mod conditioning;
pub mod detector;
pub mod report;
pub mod threshold;

// Re-export commonly used types
pub use conditioning::{condition, ConditionedFrame, ConditioningConfig};
pub use detector::{classify, DetectionState, DetectorConfig, TickSignals, WindowDetector, WindowState};
pub use report::{DetectionReport, OpenInterval, ReportRow};
pub use threshold::PiecewiseLinear;
