//! Integration tests: detection through alert dispatch

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use regression_alerting::alert_manager::ConsoleChannel;
use regression_alerting::*;
use std::io::Write;
use std::sync::Arc;

/// Collects every alert handed to it
#[derive(Default)]
struct CollectingChannel {
    alerts: Mutex<Vec<Alert>>,
}

#[async_trait]
impl NotificationChannel for CollectingChannel {
    fn name(&self) -> &str {
        "collector"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, alert: &Alert) -> AlertResult<()> {
        self.alerts.lock().push(alert.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Create run statistics with the given duration and heap means
fn create_statistics(duration_mean: f64, heap_mean: f64, success_rate: f64) -> Statistics {
    Statistics {
        duration: MetricSample::new(duration_mean, 10.0, 30),
        memory: MemoryStatistics {
            heap: MetricSample::new(heap_mean, 16.0, 30),
        },
        success_rate,
        error_rate: 1.0 - success_rate,
    }
}

fn create_baseline() -> Baseline {
    Baseline {
        statistics: create_statistics(100.0, 256.0, 0.99),
        sample_size: 30,
        captured_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_regression_is_detected_and_alerted() {
    let detector = RegressionDetector::new(DetectorConfig::default()).unwrap();
    let baseline = create_baseline();

    let requests = vec![
        DetectionRequest {
            environment: "staging".to_string(),
            test_suite: "checkout".to_string(),
            current: create_statistics(135.0, 256.0, 0.99).into(),
            baseline: Some(baseline.clone()),
            history: None,
        },
        DetectionRequest {
            environment: "staging".to_string(),
            test_suite: "search".to_string(),
            current: create_statistics(101.0, 258.0, 0.99).into(),
            baseline: Some(baseline.clone()),
            history: None,
        },
        DetectionRequest {
            environment: "staging".to_string(),
            test_suite: "login".to_string(),
            current: create_statistics(100.0, 256.0, 0.99).into(),
            baseline: None,
            history: None,
        },
    ];

    let detections = detector.detect_batch(&requests);
    assert_eq!(detections.len(), 3);
    assert!(detections[0].has_regression());
    assert!(!detections[1].has_regression());
    assert!(matches!(detections[2], Detection::Skipped { .. }));

    let payload =
        AlertPayload::from_analyses(detections.iter().filter_map(Detection::analysis)).unwrap();
    assert_eq!(payload.alert_type, "perf_regression");
    assert_eq!(payload.severity, AlertSeverity::Critical);
    assert_eq!(payload.regressions.len(), 1);
    assert_eq!(payload.regressions[0].test_suite, "checkout");

    let collector = Arc::new(CollectingChannel::default());
    let channels: Vec<Arc<dyn NotificationChannel>> = vec![collector.clone()];
    let manager = AlertManager::with_channels(AlertManagerConfig::default(), channels).unwrap();

    let result = manager.send_alert(payload.clone()).await;
    assert!(result.success());
    assert_eq!(result.channels(), ["collector".to_string()]);

    let alerts = collector.alerts.lock().clone();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].environment, "staging");
    assert_eq!(
        alerts[0].summary,
        "1 performance regression(s) detected (1 critical, 0 warning)"
    );
    assert!(!alerts[0].recommendations.is_empty());

    // Re-running the same check inside the suppression window is dropped
    let repeated = manager.send_alert(payload).await;
    assert!(repeated.is_rate_limited());
    assert_eq!(manager.get_alert_stats().total, 1);
}

#[tokio::test]
async fn test_console_channel_prints_dispatched_alert() {
    let buffer = SharedBuffer::default();
    let console = ConsoleChannel::with_writer(
        regression_alerting::alert_manager::ConsoleConfig {
            enabled: true,
            colored: false,
        },
        Box::new(buffer.clone()),
    );
    let channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(console)];
    let manager = AlertManager::with_channels(AlertManagerConfig::default(), channels).unwrap();

    let detector = RegressionDetector::default();
    let analysis = detector
        .detect(
            "production",
            "upload",
            &create_statistics(100.0, 400.0, 0.99).into(),
            Some(&create_baseline()),
        )
        .into_analysis()
        .unwrap();
    assert!(analysis.is_regression);

    let payload = AlertPayload::from_analyses([&analysis]).unwrap();
    let result = manager.send_alert(payload).await;
    assert!(result.success());

    let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
    assert!(output.contains("Environment: production"));
    assert!(output.contains("upload (production): memory.heap"));
}

#[test]
fn test_inputs_parse_from_json() {
    let baseline: Baseline = serde_json::from_str(
        r#"{
            "statistics": {
                "duration": {"mean": 100.0, "stdDev": 10.0, "sampleSize": 30},
                "memory": {"heap": {"mean": 256.0, "stdDev": 16.0, "sampleSize": 30}},
                "successRate": 0.99,
                "errorRate": 0.01
            },
            "sampleSize": 30,
            "capturedAt": "2024-05-01T12:00:00Z"
        }"#,
    )
    .unwrap();
    let current: TestResult = serde_json::from_str(
        r#"{
            "statistics": {
                "duration": {"mean": 100.0, "stdDev": 10.0, "sampleSize": 30},
                "memory": {"heap": {"mean": 256.0, "stdDev": 16.0, "sampleSize": 30}},
                "successRate": 0.99,
                "errorRate": 0.01
            }
        }"#,
    )
    .unwrap();

    let detection = RegressionDetector::default().detect_with_history(
        "ci",
        "smoke",
        &current,
        Some(&baseline),
        &[100.0, 99.0, 101.0, 100.0],
    );
    let analysis = detection.into_analysis().unwrap();
    assert!(!analysis.is_regression);
}
