//! Configuration for the regression detector

use crate::error::{RegressionError, RegressionResult};
use serde::{Deserialize, Serialize};

/// Warning/critical bands for one metric category, in percent (or
/// percentage points for reliability)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    /// Change at which a metric becomes a warning
    pub warning: f64,
    /// Change at which a metric becomes critical
    pub critical: f64,
}

impl SeverityThresholds {
    fn validate(&self, category: &str) -> RegressionResult<()> {
        if !(self.warning > 0.0 && self.critical > 0.0) {
            return Err(RegressionError::ConfigurationError {
                parameter: format!("thresholds.{}", category),
                message: "thresholds must be positive".to_string(),
            });
        }
        if self.warning >= self.critical {
            return Err(RegressionError::ConfigurationError {
                parameter: format!("thresholds.{}", category),
                message: format!(
                    "warning ({}) must be below critical ({})",
                    self.warning, self.critical
                ),
            });
        }
        Ok(())
    }
}

/// Per-category thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Timing metrics
    pub performance: SeverityThresholds,
    /// Memory metrics
    pub memory: SeverityThresholds,
    /// Success rate, in percentage points
    pub reliability: SeverityThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            performance: SeverityThresholds {
                warning: 15.0,
                critical: 30.0,
            },
            memory: SeverityThresholds {
                warning: 20.0,
                critical: 40.0,
            },
            reliability: SeverityThresholds {
                warning: 5.0,
                critical: 10.0,
            },
        }
    }
}

/// Enable flags for the four detection algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmToggles {
    /// Statistical significance test
    pub statistical: bool,
    /// Trend analysis
    pub trend: bool,
    /// Change-point detection
    pub change_point: bool,
    /// Anomaly detection
    pub anomaly: bool,
}

impl Default for AlgorithmToggles {
    fn default() -> Self {
        Self {
            statistical: true,
            trend: true,
            change_point: true,
            anomaly: true,
        }
    }
}

/// Regression detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Severity thresholds per metric category
    pub thresholds: ThresholdConfig,
    /// Which algorithms run
    pub algorithms: AlgorithmToggles,
    /// Z-score above which the anomaly detector fires
    pub anomaly_z_threshold: f64,
    /// `|Δmean| / baseline.std_dev` above which a change point is reported
    pub change_point_ratio_threshold: f64,
    /// Improvement (percent) a significant metric needs to flag an improvement
    pub improvement_threshold: f64,
    /// Points in the interpolated series used when no history is supplied
    pub interpolation_points: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            algorithms: AlgorithmToggles::default(),
            anomaly_z_threshold: 2.0,
            change_point_ratio_threshold: 2.0,
            improvement_threshold: 10.0,
            interpolation_points: 5,
        }
    }
}

impl DetectorConfig {
    /// Reject inconsistent thresholds
    pub fn validate(&self) -> RegressionResult<()> {
        self.thresholds.performance.validate("performance")?;
        self.thresholds.memory.validate("memory")?;
        self.thresholds.reliability.validate("reliability")?;

        for (parameter, value) in [
            ("anomaly_z_threshold", self.anomaly_z_threshold),
            (
                "change_point_ratio_threshold",
                self.change_point_ratio_threshold,
            ),
            ("improvement_threshold", self.improvement_threshold),
        ] {
            if !(value > 0.0) {
                return Err(RegressionError::ConfigurationError {
                    parameter: parameter.to_string(),
                    message: format!("must be positive, got {}", value),
                });
            }
        }

        if self.interpolation_points < 2 {
            return Err(RegressionError::ConfigurationError {
                parameter: "interpolation_points".to_string(),
                message: "need at least two points".to_string(),
            });
        }
        Ok(())
    }
}
