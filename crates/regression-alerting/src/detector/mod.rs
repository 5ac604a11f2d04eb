//! Regression detection over a baseline/current statistics pair
//!
//! Four independent algorithms run over the same pair and their verdicts are
//! merged into one [`Analysis`]:
//! - statistical significance (effect size against category thresholds)
//! - trend (history window, or an interpolated degraded mode)
//! - change-point (CUSUM and mean-shift ratio)
//! - anomaly (Z-score, IQR proxy, modified Z-score)
//!
//! The detector holds only configuration and can be shared across threads.

pub mod anomaly;
pub mod change_point;
pub mod config;
pub mod statistical;
pub mod trend;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{AlgorithmToggles, DetectorConfig, SeverityThresholds, ThresholdConfig};
pub use types::*;

use crate::error::RegressionResult;
use crate::statistics::{Baseline, Severity, Statistics, TestResult};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// One environment/test-suite pair to analyse in a batch
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Environment name
    pub environment: String,
    /// Test suite name
    pub test_suite: String,
    /// Completed run
    pub current: TestResult,
    /// Accepted baseline, if one exists
    pub baseline: Option<Baseline>,
    /// Recent duration means, oldest first
    pub history: Option<Vec<f64>>,
}

/// Stateless regression detector
#[derive(Debug, Clone, Default)]
pub struct RegressionDetector {
    config: DetectorConfig,
}

impl RegressionDetector {
    /// Create a detector after validating its configuration
    pub fn new(config: DetectorConfig) -> RegressionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyse one run against its baseline.
    ///
    /// Without a history window the trend algorithm runs in its interpolated
    /// degraded mode. Never fails: unusable input yields
    /// [`Detection::Skipped`].
    pub fn detect(
        &self,
        environment: &str,
        test_suite: &str,
        current: &TestResult,
        baseline: Option<&Baseline>,
    ) -> Detection {
        self.run(environment, test_suite, current, baseline, None)
    }

    /// Analyse one run with a genuine history of duration means (oldest first)
    pub fn detect_with_history(
        &self,
        environment: &str,
        test_suite: &str,
        current: &TestResult,
        baseline: Option<&Baseline>,
        history: &[f64],
    ) -> Detection {
        self.run(environment, test_suite, current, baseline, Some(history))
    }

    /// Analyse independent pairs in parallel, preserving request order
    pub fn detect_batch(&self, requests: &[DetectionRequest]) -> Vec<Detection> {
        requests
            .par_iter()
            .map(|req| {
                self.run(
                    &req.environment,
                    &req.test_suite,
                    &req.current,
                    req.baseline.as_ref(),
                    req.history.as_deref(),
                )
            })
            .collect()
    }

    fn run(
        &self,
        environment: &str,
        test_suite: &str,
        current: &TestResult,
        baseline: Option<&Baseline>,
        history: Option<&[f64]>,
    ) -> Detection {
        let (baseline, current_stats) = match (baseline, current.statistics.as_ref()) {
            (Some(baseline), Some(stats)) => (baseline, stats),
            _ => {
                warn!(
                    environment,
                    test_suite, "Skipping regression detection: {}", SKIPPED_REASON
                );
                return Detection::skipped();
            }
        };

        if let Err(e) = baseline
            .statistics
            .validate()
            .and_then(|_| current_stats.validate())
        {
            warn!(
                environment,
                test_suite, "Skipping regression detection on invalid statistics: {}", e
            );
            return Detection::skipped();
        }

        let analysis = self.analyze(environment, test_suite, baseline, current_stats, history);

        if analysis.is_regression {
            info!(
                environment,
                test_suite,
                severity = %analysis.severity,
                confidence = analysis.confidence,
                "{}",
                analysis.summary
            );
        } else {
            debug!(environment, test_suite, "{}", analysis.summary);
        }

        Detection::Analyzed(Box::new(analysis))
    }

    fn analyze(
        &self,
        environment: &str,
        test_suite: &str,
        baseline: &Baseline,
        current: &Statistics,
        history: Option<&[f64]>,
    ) -> Analysis {
        let cfg = &self.config;
        let base = &baseline.statistics;
        let mut algorithms = AlgorithmResults::default();
        let mut detections = Vec::new();

        if cfg.algorithms.statistical {
            let result = statistical::analyze(base, current, &cfg.thresholds);
            detections.extend(statistical::detection(&result, &cfg.thresholds));
            algorithms.statistical = Some(result);
        }

        if cfg.algorithms.trend {
            let (series, source) = trend::build_series(
                history,
                base.duration.mean,
                current.duration.mean,
                cfg.interpolation_points,
            );
            let result = trend::analyze_series(&series, source);
            detections.extend(trend::detection(&result));
            algorithms.trend = Some(result);
        }

        if cfg.algorithms.change_point {
            let result = change_point::analyze(
                &base.duration,
                &current.duration,
                cfg.change_point_ratio_threshold,
            );
            detections.extend(change_point::detection(&result));
            algorithms.change_point = Some(result);
        }

        if cfg.algorithms.anomaly {
            let result = anomaly::analyze(&base.duration, &current.duration, cfg.anomaly_z_threshold);
            detections.extend(anomaly::detection(&result, cfg.anomaly_z_threshold));
            algorithms.anomaly = Some(result);
        }

        let is_improvement = algorithms
            .statistical
            .as_ref()
            .is_some_and(|s| statistical::is_improvement(s, cfg.improvement_threshold));

        let (severity, confidence) = merge(&detections);
        let detecting_algorithms: Vec<Algorithm> =
            detections.iter().map(|d| d.algorithm).collect();
        let is_regression = !detections.is_empty();

        let recommendations =
            recommendations(&algorithms, severity, is_improvement, cfg.improvement_threshold);
        let summary = summarize(
            environment,
            test_suite,
            is_regression,
            is_improvement,
            severity,
            confidence,
            &detecting_algorithms,
        );

        Analysis {
            test_suite: test_suite.to_string(),
            environment: environment.to_string(),
            timestamp: Utc::now(),
            baseline: baseline.clone(),
            current: *current,
            algorithms,
            is_regression,
            is_improvement,
            severity,
            confidence,
            detecting_algorithms,
            summary,
            recommendations,
        }
    }
}

/// Max severity and mean confidence over fired algorithms
pub fn merge(detections: &[AlgorithmDetection]) -> (Severity, f64) {
    let severity = detections
        .iter()
        .map(|d| d.severity)
        .max()
        .unwrap_or(Severity::Normal);
    let confidence = if detections.is_empty() {
        0.0
    } else {
        detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64
    };
    (severity, confidence)
}

/// Rule table from merge outcome to recommendations, in insertion order
pub fn recommendations(
    algorithms: &AlgorithmResults,
    severity: Severity,
    is_improvement: bool,
    improvement_threshold: f64,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if severity == Severity::Critical {
        out.push(Recommendation {
            category: RecommendationCategory::ImmediateAction,
            priority: Priority::High,
            message: "Critical performance regression detected. Investigate recent changes \
                      and consider rolling back before further deployments."
                .to_string(),
        });
    }

    if let Some(stats) = &algorithms.statistical {
        if stats.duration.is_degradation() {
            out.push(Recommendation {
                category: RecommendationCategory::PerformanceOptimization,
                priority: Priority::High,
                message: format!(
                    "Test duration increased by {:.1}%. Profile the slowest code paths \
                     and review recently changed hot spots.",
                    stats.duration.percentage_change
                ),
            });
        }
        if stats.memory.is_degradation() {
            out.push(Recommendation {
                category: RecommendationCategory::MemoryOptimization,
                priority: Priority::Medium,
                message: format!(
                    "Heap usage increased by {:.1}%. Check for leaks, oversized caches \
                     and retained allocations.",
                    stats.memory.percentage_change
                ),
            });
        }
    }

    if algorithms
        .trend
        .as_ref()
        .is_some_and(|t| t.is_degrading_trend)
    {
        out.push(Recommendation {
            category: RecommendationCategory::Monitoring,
            priority: Priority::Medium,
            message: "Performance is trending worse across runs. Increase monitoring \
                      frequency for this suite."
                .to_string(),
        });
    }

    if is_improvement {
        out.push(Recommendation {
            category: RecommendationCategory::Documentation,
            priority: Priority::Low,
            message: format!(
                "Performance improved by more than {:.0}%. Document the change and \
                 refresh the baseline.",
                improvement_threshold
            ),
        });
    }

    out
}

fn summarize(
    environment: &str,
    test_suite: &str,
    is_regression: bool,
    is_improvement: bool,
    severity: Severity,
    confidence: f64,
    algorithms: &[Algorithm],
) -> String {
    if is_regression {
        let names: Vec<&str> = algorithms.iter().map(Algorithm::as_str).collect();
        format!(
            "Performance regression in {} ({}): severity {}, confidence {:.1}%, detected by {}",
            test_suite,
            environment,
            severity,
            confidence * 100.0,
            names.join(", ")
        )
    } else if is_improvement {
        format!(
            "Performance improvement in {} ({})",
            test_suite, environment
        )
    } else {
        format!(
            "No significant performance change in {} ({})",
            test_suite, environment
        )
    }
}
