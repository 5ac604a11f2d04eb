//! Statistical significance test over duration, heap and success rate

use super::config::ThresholdConfig;
use super::types::{Algorithm, AlgorithmDetection, StatisticalAnalysis};
use crate::statistics::{compare_metric, compare_reliability, MetricCategory, Statistics};

/// Compare every tracked metric against the baseline
pub fn analyze(
    baseline: &Statistics,
    current: &Statistics,
    thresholds: &ThresholdConfig,
) -> StatisticalAnalysis {
    StatisticalAnalysis {
        duration: compare_metric(
            "duration",
            MetricCategory::Performance,
            &baseline.duration,
            &current.duration,
            &thresholds.performance,
        ),
        memory: compare_metric(
            "memory.heap",
            MetricCategory::Memory,
            &baseline.memory.heap,
            &current.memory.heap,
            &thresholds.memory,
        ),
        reliability: compare_reliability(baseline, current, &thresholds.reliability),
    }
}

/// Detection entry when any metric significantly degraded.
///
/// Confidence is `1 - approximate_p_value` of the strongest metric; a
/// reliability-only regression scores its drop against the critical band.
pub fn detection(
    analysis: &StatisticalAnalysis,
    thresholds: &ThresholdConfig,
) -> Option<AlgorithmDetection> {
    if !analysis.has_regression() {
        return None;
    }

    let mut severity = crate::statistics::Severity::Normal;
    let mut confidence: f64 = 0.0;

    for metric in analysis.degraded_metrics() {
        severity = severity.max(metric.severity);
        confidence = confidence.max(1.0 - metric.approximate_p_value);
    }

    let reliability = &analysis.reliability;
    if reliability.is_degradation() {
        severity = severity.max(reliability.severity);
        let points = reliability.success_rate_change.abs() * 100.0;
        confidence = confidence.max((points / thresholds.reliability.critical).min(1.0));
    }

    Some(AlgorithmDetection {
        algorithm: Algorithm::Statistical,
        confidence,
        severity,
    })
}

/// A significant metric improved by more than `threshold` percent
pub fn is_improvement(analysis: &StatisticalAnalysis, threshold: f64) -> bool {
    [&analysis.duration, &analysis.memory]
        .into_iter()
        .any(|m| m.is_significant && m.percentage_change < -threshold)
}
