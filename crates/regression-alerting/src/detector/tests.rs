//! Behavioural tests for the merged detector

use super::*;
use crate::statistics::{MemoryStatistics, MetricSample};
use chrono::Utc;

fn stats(duration: MetricSample, heap: MetricSample, success_rate: f64) -> Statistics {
    Statistics {
        duration,
        memory: MemoryStatistics { heap },
        success_rate,
        error_rate: 1.0 - success_rate,
    }
}

fn default_stats() -> Statistics {
    stats(
        MetricSample::new(100.0, 10.0, 30),
        MetricSample::new(256.0, 16.0, 30),
        0.98,
    )
}

fn baseline_of(statistics: Statistics) -> Baseline {
    Baseline {
        statistics,
        sample_size: 30,
        captured_at: Utc::now(),
    }
}

fn detector() -> RegressionDetector {
    RegressionDetector::new(DetectorConfig::default()).unwrap()
}

#[test]
fn test_missing_baseline_is_skipped() {
    let result = detector().detect("staging", "api", &default_stats().into(), None);

    assert!(!result.has_regression());
    assert!(result.analysis().is_none());
    match result {
        Detection::Skipped {
            has_regression,
            reason,
        } => {
            assert!(!has_regression);
            assert_eq!(reason, "no baseline or invalid current result");
        }
        Detection::Analyzed(_) => panic!("expected skip"),
    }
}

#[test]
fn test_missing_current_statistics_is_skipped() {
    let baseline = baseline_of(default_stats());
    let result = detector().detect("staging", "api", &TestResult::default(), Some(&baseline));

    assert!(matches!(result, Detection::Skipped { .. }));
}

#[test]
fn test_negative_std_dev_is_skipped() {
    let heap = MetricSample::new(256.0, 16.0, 30);
    let baseline = baseline_of(stats(MetricSample::new(100.0, -10.0, 30), heap, 0.98));
    let current = stats(MetricSample::new(100.5, -10.0, 30), heap, 0.98);

    let result = detector().detect("staging", "api", &current.into(), Some(&baseline));

    assert!(!result.has_regression());
    assert!(result.analysis().is_none());
}

#[test]
fn test_zero_sample_size_in_current_is_skipped() {
    let baseline = baseline_of(default_stats());
    let current = stats(
        MetricSample::new(135.0, 10.0, 0),
        MetricSample::new(256.0, 16.0, 30),
        0.98,
    );

    let result = detector().detect("staging", "api", &current.into(), Some(&baseline));

    assert!(matches!(result, Detection::Skipped { .. }));
}

#[test]
fn test_out_of_range_success_rate_is_skipped() {
    let baseline = baseline_of(default_stats());
    let mut current = default_stats();
    current.success_rate = 1.5;

    let result = detector().detect("staging", "api", &current.into(), Some(&baseline));

    assert!(matches!(result, Detection::Skipped { .. }));
}

#[test]
fn test_identical_statistics_no_regression_no_improvement() {
    let baseline = baseline_of(default_stats());
    let analysis = detector()
        .detect("staging", "api", &default_stats().into(), Some(&baseline))
        .into_analysis()
        .unwrap();

    assert!(!analysis.is_regression);
    assert!(!analysis.is_improvement);
    assert_eq!(analysis.severity, Severity::Normal);
    assert_eq!(analysis.confidence, 0.0);
    assert!(analysis.detecting_algorithms.is_empty());
    assert!(analysis.recommendations.is_empty());
    assert!(analysis.summary.starts_with("No significant performance change"));
}

#[test]
fn test_critical_duration_regression_scenario() {
    let baseline = baseline_of(default_stats());
    let mut current = default_stats();
    current.duration = MetricSample::new(135.0, 10.0, 30);

    let analysis = detector()
        .detect("staging", "api", &current.into(), Some(&baseline))
        .into_analysis()
        .unwrap();

    let duration = analysis.duration_comparison().unwrap();
    assert!((duration.percentage_change - 35.0).abs() < 1e-9);
    assert!((duration.effect_size - 3.5).abs() < 1e-9);
    assert_eq!(duration.severity, Severity::Critical);

    assert!(analysis.is_regression);
    assert!(!analysis.is_improvement);
    assert_eq!(analysis.severity, Severity::Critical);
    assert_eq!(
        analysis.detecting_algorithms,
        vec![
            Algorithm::Statistical,
            Algorithm::Trend,
            Algorithm::ChangePoint,
            Algorithm::Anomaly
        ]
    );

    // statistical 0.999, trend 1.0, change point 0.875, anomaly 0.875
    let expected = (0.999 + 1.0 + 0.875 + 0.875) / 4.0;
    assert!((analysis.confidence - expected).abs() < 1e-9);

    let categories: Vec<_> = analysis
        .recommendations
        .iter()
        .map(|r| r.category)
        .collect();
    assert_eq!(
        categories,
        vec![
            RecommendationCategory::ImmediateAction,
            RecommendationCategory::PerformanceOptimization,
            RecommendationCategory::Monitoring,
        ]
    );
    assert!(analysis.recommendations[1].message.contains("35.0%"));
}

#[test]
fn test_reliability_drop_is_warning() {
    let baseline = baseline_of(default_stats());
    let mut current = default_stats();
    current.success_rate = 0.90;
    current.error_rate = 0.10;

    let analysis = detector()
        .detect("prod", "checkout", &current.into(), Some(&baseline))
        .into_analysis()
        .unwrap();

    let reliability = &analysis.algorithms.statistical.as_ref().unwrap().reliability;
    assert!((reliability.success_rate_change + 0.08).abs() < 1e-9);
    assert_eq!(reliability.severity, Severity::Warning);

    assert!(analysis.is_regression);
    assert_eq!(analysis.severity, Severity::Warning);
    assert_eq!(analysis.detecting_algorithms, vec![Algorithm::Statistical]);
}

#[test]
fn test_memory_regression_recommendation() {
    let baseline = baseline_of(default_stats());
    let mut current = default_stats();
    current.memory.heap = MetricSample::new(320.0, 16.0, 30);

    let analysis = detector()
        .detect("staging", "api", &current.into(), Some(&baseline))
        .into_analysis()
        .unwrap();

    assert!(analysis.is_regression);
    assert_eq!(analysis.severity, Severity::Warning);
    assert!(analysis
        .recommendations
        .iter()
        .any(|r| r.category == RecommendationCategory::MemoryOptimization));
}

#[test]
fn test_improvement_detected() {
    let baseline = baseline_of(default_stats());
    let mut current = default_stats();
    current.duration = MetricSample::new(75.0, 10.0, 30);

    let analysis = detector()
        .detect("staging", "api", &current.into(), Some(&baseline))
        .into_analysis()
        .unwrap();

    assert!(analysis.is_improvement);
    assert!(!analysis.is_regression);
    assert_eq!(
        analysis.recommendations.last().unwrap().category,
        RecommendationCategory::Documentation
    );
    assert!(analysis.summary.starts_with("Performance improvement"));
}

#[test]
fn test_disabled_algorithms_do_not_run() {
    let config = DetectorConfig {
        algorithms: AlgorithmToggles {
            statistical: true,
            trend: false,
            change_point: false,
            anomaly: false,
        },
        ..DetectorConfig::default()
    };
    let detector = RegressionDetector::new(config).unwrap();

    let baseline = baseline_of(default_stats());
    let mut current = default_stats();
    current.duration = MetricSample::new(135.0, 10.0, 30);

    let analysis = detector
        .detect("staging", "api", &current.into(), Some(&baseline))
        .into_analysis()
        .unwrap();

    assert!(analysis.algorithms.trend.is_none());
    assert!(analysis.algorithms.change_point.is_none());
    assert!(analysis.algorithms.anomaly.is_none());
    assert_eq!(analysis.detecting_algorithms, vec![Algorithm::Statistical]);
    assert!((analysis.confidence - 0.999).abs() < 1e-9);
}

#[test]
fn test_history_window_overrides_interpolation() {
    let baseline = baseline_of(default_stats());
    let mut current = default_stats();
    current.duration = MetricSample::new(104.0, 10.0, 30);

    let history = [100.0, 101.0, 102.0, 103.0];
    let analysis = detector()
        .detect_with_history("staging", "api", &current.into(), Some(&baseline), &history)
        .into_analysis()
        .unwrap();

    let trend = analysis.algorithms.trend.as_ref().unwrap();
    assert_eq!(trend.source, TrendSource::History);
    assert_eq!(trend.points, 5);
    assert!(trend.correlation > 0.99);
}

#[test]
fn test_batch_preserves_order() {
    let baseline = baseline_of(default_stats());
    let mut slow = default_stats();
    slow.duration = MetricSample::new(140.0, 10.0, 30);

    let requests = vec![
        DetectionRequest {
            environment: "staging".to_string(),
            test_suite: "fast".to_string(),
            current: default_stats().into(),
            baseline: Some(baseline.clone()),
            history: None,
        },
        DetectionRequest {
            environment: "staging".to_string(),
            test_suite: "slow".to_string(),
            current: slow.into(),
            baseline: Some(baseline),
            history: None,
        },
        DetectionRequest {
            environment: "staging".to_string(),
            test_suite: "new".to_string(),
            current: default_stats().into(),
            baseline: None,
            history: None,
        },
    ];

    let results = detector().detect_batch(&requests);
    assert_eq!(results.len(), 3);
    assert!(!results[0].has_regression());
    assert!(results[1].has_regression());
    assert_eq!(results[1].analysis().unwrap().test_suite, "slow");
    assert!(matches!(results[2], Detection::Skipped { .. }));
}

#[test]
fn test_merge_empty_and_mixed() {
    assert_eq!(merge(&[]), (Severity::Normal, 0.0));

    let detections = vec![
        AlgorithmDetection {
            algorithm: Algorithm::Trend,
            confidence: 0.5,
            severity: Severity::Warning,
        },
        AlgorithmDetection {
            algorithm: Algorithm::Anomaly,
            confidence: 1.0,
            severity: Severity::Critical,
        },
    ];
    assert_eq!(merge(&detections), (Severity::Critical, 0.75));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = DetectorConfig::default();
    config.thresholds.performance.warning = 40.0;
    assert!(RegressionDetector::new(config).is_err());
}

#[test]
fn test_analysis_serializes_camel_case() {
    let baseline = baseline_of(default_stats());
    let analysis = detector()
        .detect("staging", "api", &default_stats().into(), Some(&baseline))
        .into_analysis()
        .unwrap();

    let json = serde_json::to_value(&analysis).unwrap();
    assert!(json.get("isRegression").is_some());
    assert!(json.get("detectingAlgorithms").is_some());
    assert!(json["algorithms"].get("changePoint").is_some());
}
