//! Anomaly estimators on the duration mean
//!
//! Only `mean`, `std_dev` and `median` are available, so the IQR and MAD
//! estimators assume a roughly normal distribution: quartiles are taken as
//! `mean ± std_dev` and MAD as `0.6745 * std_dev`. Both lose validity for
//! skewed timings.

use super::types::{Algorithm, AlgorithmDetection, AnomalyAnalysis, EstimatorResult, IqrResult};
use crate::statistics::{safe_ratio, MetricSample, Severity};

/// Modified Z-score limit (Iglewicz and Hoaglin)
pub const MODIFIED_Z_THRESHOLD: f64 = 3.5;
/// Normal-consistency constant relating MAD and standard deviation
const MAD_CONSTANT: f64 = 0.6745;
const IQR_FENCE: f64 = 1.5;

/// Run all three estimators
pub fn analyze(
    baseline: &MetricSample,
    current: &MetricSample,
    z_threshold: f64,
) -> AnomalyAnalysis {
    let delta = current.mean - baseline.mean;

    let z = safe_ratio(delta.abs(), baseline.std_dev);
    let z_score = EstimatorResult {
        score: z,
        is_anomaly: z > z_threshold,
    };

    let q1 = baseline.mean - baseline.std_dev;
    let q3 = baseline.mean + baseline.std_dev;
    let iqr_width = q3 - q1;
    let lower_fence = q1 - IQR_FENCE * iqr_width;
    let upper_fence = q3 + IQR_FENCE * iqr_width;
    let iqr = IqrResult {
        lower_fence,
        upper_fence,
        is_anomaly: current.mean < lower_fence || current.mean > upper_fence,
    };

    let mad = MAD_CONSTANT * baseline.std_dev;
    let modified_z = safe_ratio(MAD_CONSTANT * (current.mean - baseline.median()), mad);
    let modified_z_score = EstimatorResult {
        score: modified_z,
        is_anomaly: modified_z.abs() > MODIFIED_Z_THRESHOLD,
    };

    let confidence = [
        (z / (2.0 * z_threshold)).min(1.0),
        if iqr.is_anomaly { 1.0 } else { 0.0 },
        (modified_z.abs() / (2.0 * MODIFIED_Z_THRESHOLD)).min(1.0),
    ]
    .into_iter()
    .fold(0.0, f64::max);

    AnomalyAnalysis {
        is_anomaly: z_score.is_anomaly || iqr.is_anomaly || modified_z_score.is_anomaly,
        confidence,
        is_increase: delta > 0.0,
        z_score,
        iqr,
        modified_z_score,
    }
}

/// Detection entry for an upward anomaly; critical beyond twice the z limit
pub fn detection(analysis: &AnomalyAnalysis, z_threshold: f64) -> Option<AlgorithmDetection> {
    if !(analysis.is_anomaly && analysis.is_increase) {
        return None;
    }
    let severity = if analysis.z_score.score > 2.0 * z_threshold {
        Severity::Critical
    } else {
        Severity::Warning
    };
    Some(AlgorithmDetection {
        algorithm: Algorithm::Anomaly,
        confidence: analysis.confidence,
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_score_fires_first() {
        let analysis = analyze(
            &MetricSample::new(100.0, 10.0, 30),
            &MetricSample::new(135.0, 10.0, 30),
            2.0,
        );

        assert!(analysis.z_score.is_anomaly);
        assert!(!analysis.iqr.is_anomaly); // upper fence 140
        assert!((analysis.modified_z_score.score - 3.5).abs() < 1e-9);
        assert!(analysis.is_anomaly);
        assert_eq!(detection(&analysis, 2.0).unwrap().severity, Severity::Warning);
    }

    #[test]
    fn test_all_estimators_fire_on_large_shift() {
        let analysis = analyze(
            &MetricSample::new(100.0, 10.0, 30),
            &MetricSample::new(160.0, 10.0, 30),
            2.0,
        );

        assert!(analysis.z_score.is_anomaly);
        assert!(analysis.iqr.is_anomaly);
        assert!(analysis.modified_z_score.is_anomaly);
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(detection(&analysis, 2.0).unwrap().severity, Severity::Critical);
    }

    #[test]
    fn test_modified_z_uses_baseline_median() {
        let mut baseline = MetricSample::new(100.0, 10.0, 30);
        baseline.median = Some(80.0);

        let analysis = analyze(&baseline, &MetricSample::new(118.0, 10.0, 30), 2.0);

        assert!((analysis.modified_z_score.score - 3.8).abs() < 1e-9);
        assert!(analysis.modified_z_score.is_anomaly);
        assert!(!analysis.z_score.is_anomaly);
    }

    #[test]
    fn test_within_spread_is_normal() {
        let analysis = analyze(
            &MetricSample::new(100.0, 10.0, 30),
            &MetricSample::new(105.0, 10.0, 30),
            2.0,
        );

        assert!(!analysis.is_anomaly);
        assert!(detection(&analysis, 2.0).is_none());
    }
}
