//! Change-point detection on the duration mean
//!
//! Two single-step tests: a CUSUM-style excess over twice the baseline
//! spread, and a plain mean-shift ratio. Either firing reports a change.

use super::types::{
    Algorithm, AlgorithmDetection, ChangePointAnalysis, CusumTest, MeanShiftTest,
};
use crate::statistics::{safe_ratio, MetricSample, Severity};

/// Run both sub-tests
pub fn analyze(
    baseline: &MetricSample,
    current: &MetricSample,
    ratio_threshold: f64,
) -> ChangePointAnalysis {
    let drift = (current.mean - baseline.mean).abs();
    let threshold = 2.0 * baseline.std_dev;
    let cumulative_sum = (drift - threshold).max(0.0);
    let cusum_detected = cumulative_sum > threshold;
    // 0.5 at the detection boundary, saturating at twice the threshold
    let cusum_score = (safe_ratio(cumulative_sum, threshold) / 2.0).min(1.0);

    let ratio = safe_ratio(drift, baseline.std_dev);
    let shift_detected = ratio > ratio_threshold;
    let shift_score = (ratio / (2.0 * ratio_threshold)).min(1.0);

    let cusum = CusumTest {
        drift,
        threshold,
        cumulative_sum,
        detected: cusum_detected,
        score: cusum_score,
    };
    let mean_shift = MeanShiftTest {
        ratio,
        detected: shift_detected,
        score: shift_score,
    };

    ChangePointAnalysis {
        has_change_point: cusum.detected || mean_shift.detected,
        confidence: cusum.score.max(mean_shift.score),
        is_increase: current.mean > baseline.mean,
        cusum,
        mean_shift,
    }
}

/// Detection entry for an upward change point
pub fn detection(analysis: &ChangePointAnalysis) -> Option<AlgorithmDetection> {
    if !(analysis.has_change_point && analysis.is_increase) {
        return None;
    }
    let severity = if analysis.cusum.detected && analysis.mean_shift.detected {
        Severity::Critical
    } else {
        Severity::Warning
    };
    Some(AlgorithmDetection {
        algorithm: Algorithm::ChangePoint,
        confidence: analysis.confidence,
        severity,
    })
}
