//! Performance regression detection with multi-algorithm verdicts and alert fan-out
//!
//! This crate provides:
//! - Statistical comparison of a test run against its baseline
//! - Regression detection merging statistical, trend, change-point and anomaly verdicts
//! - Recommendations and human-readable summaries for every analysis
//! - Rate-limited, deduplicated alert dispatch to console, email, Slack, Teams and webhooks
//! - Bounded alert history with aggregate statistics

#![warn(missing_docs)]

pub mod alert_manager;
pub mod config;
pub mod detector;
pub mod error;
pub mod statistics;

pub use alert_manager::{
    Alert, AlertManager, AlertManagerConfig, AlertPayload, AlertSeverity, AlertStats,
    DispatchResult, NotificationChannel, RegressionEntry,
};
pub use config::EngineConfig;
pub use detector::{
    Analysis, Detection, DetectionRequest, DetectorConfig, Recommendation, RegressionDetector,
};
pub use error::{AlertError, AlertResult, RegressionError, RegressionResult};
pub use statistics::{Baseline, MemoryStatistics, MetricSample, Severity, Statistics, TestResult};
