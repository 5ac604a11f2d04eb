//! Statistical comparison of baseline and current metric distributions
//!
//! Everything here is a pure function over compact distribution summaries
//! (`mean`, `std_dev`, `median`, `sample_size`). No raw samples are ever seen,
//! which is why several estimators below are approximations.

use crate::detector::config::SeverityThresholds;
use crate::error::{RegressionError, RegressionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// z-value for a two-sided 95% confidence interval
pub const Z_95: f64 = 1.96;

/// Minimum Cohen's d for a change to count as significant
pub const MIN_EFFECT_SIZE: f64 = 0.5;

/// Compact distributional summary of one numeric metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    /// Arithmetic mean
    pub mean: f64,
    /// Standard deviation (never negative)
    pub std_dev: f64,
    /// Median; defaults to the mean when the harness omits it
    #[serde(default)]
    pub median: Option<f64>,
    /// Number of samples summarized (at least 1)
    pub sample_size: u64,
}

impl MetricSample {
    /// Create a sample whose median equals its mean
    pub fn new(mean: f64, std_dev: f64, sample_size: u64) -> Self {
        Self {
            mean,
            std_dev,
            median: None,
            sample_size,
        }
    }

    /// Median, falling back to the mean
    pub fn median(&self) -> f64 {
        self.median.unwrap_or(self.mean)
    }

    /// Check `std_dev >= 0` and `sample_size >= 1`
    pub fn validate(&self, metric: &str) -> RegressionResult<()> {
        if !self.mean.is_finite() || !self.std_dev.is_finite() {
            return Err(RegressionError::DataValidationFailed {
                validation_type: metric.to_string(),
                details: "mean and std_dev must be finite".to_string(),
            });
        }
        if self.std_dev < 0.0 {
            return Err(RegressionError::DataValidationFailed {
                validation_type: metric.to_string(),
                details: format!("std_dev must be >= 0, got {}", self.std_dev),
            });
        }
        if self.sample_size == 0 {
            return Err(RegressionError::DataValidationFailed {
                validation_type: metric.to_string(),
                details: "sample_size must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Memory metrics of a test run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryStatistics {
    /// Heap usage
    pub heap: MetricSample,
}

/// Per-run statistical summary produced by the test harness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Test duration
    pub duration: MetricSample,
    /// Memory usage
    pub memory: MemoryStatistics,
    /// Fraction of passing tests in [0, 1]
    pub success_rate: f64,
    /// Fraction of erroring tests in [0, 1]
    pub error_rate: f64,
}

impl Statistics {
    /// Validate every metric sample and the rate bounds
    pub fn validate(&self) -> RegressionResult<()> {
        self.duration.validate("duration")?;
        self.memory.heap.validate("memory.heap")?;
        for (name, rate) in [
            ("success_rate", self.success_rate),
            ("error_rate", self.error_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(RegressionError::DataValidationFailed {
                    validation_type: name.to_string(),
                    details: format!("expected a value in [0, 1], got {}", rate),
                });
            }
        }
        Ok(())
    }
}

/// A completed test run as handed over by the harness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Run statistics; `None` when the run produced no usable summary
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

impl From<Statistics> for TestResult {
    fn from(statistics: Statistics) -> Self {
        Self {
            statistics: Some(statistics),
        }
    }
}

/// Accepted historical norm for one environment/test-suite pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    /// Baseline statistics
    pub statistics: Statistics,
    /// Number of runs folded into the baseline
    pub sample_size: u64,
    /// When the baseline was captured
    pub captured_at: DateTime<Utc>,
}

/// Verdict severity, ordered `Normal < Warning < Critical`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No actionable change
    #[default]
    Normal,
    /// Change beyond the warning threshold
    Warning,
    /// Change beyond the critical threshold
    Critical,
}

impl Severity {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold family a metric is judged against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    /// Timing metrics
    Performance,
    /// Memory metrics
    Memory,
    /// Success/error rates
    Reliability,
}

/// Symmetric confidence interval around a mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
}

/// Outcome of comparing one baseline metric with its current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    /// Metric name (`duration`, `memory.heap`)
    pub metric: String,
    /// Threshold family used
    pub category: MetricCategory,
    /// Baseline mean
    pub baseline_mean: f64,
    /// Current mean
    pub current_mean: f64,
    /// Relative change in percent; positive means the metric grew
    pub percentage_change: f64,
    /// `sqrt((base.std_dev² + cur.std_dev²) / 2)`
    pub pooled_std_dev: f64,
    /// Cohen's d over the absolute mean difference
    pub effect_size: f64,
    /// Bucketed p-value proxy derived from the effect size.
    ///
    /// This is a heuristic confidence indicator, not the result of a
    /// hypothesis test; see [`approximate_p_value`].
    pub approximate_p_value: f64,
    /// 95% interval of the baseline mean
    pub baseline_interval: ConfidenceInterval,
    /// 95% interval of the current mean
    pub current_interval: ConfidenceInterval,
    /// `|percentage_change| >= warning` and `effect_size >= 0.5`
    pub is_significant: bool,
    /// Severity band of `|percentage_change|`
    pub severity: Severity,
}

impl MetricComparison {
    /// Significant and the metric got larger (slower / heavier)
    pub fn is_degradation(&self) -> bool {
        self.is_significant && self.percentage_change > 0.0
    }
}

/// Outcome of comparing success rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityComparison {
    /// Baseline success rate
    pub baseline_success_rate: f64,
    /// Current success rate
    pub current_success_rate: f64,
    /// `current.success_rate - baseline.success_rate`, as a fraction
    pub success_rate_change: f64,
    /// `current.error_rate - baseline.error_rate`, as a fraction
    pub error_rate_change: f64,
    /// `|success_rate_change|` in points reached the warning threshold
    pub is_significant: bool,
    /// Severity band of `|success_rate_change|` in points
    pub severity: Severity,
}

impl ReliabilityComparison {
    /// Significant and the success rate dropped
    pub fn is_degradation(&self) -> bool {
        self.is_significant && self.success_rate_change < 0.0
    }
}

/// `num / den`, mapping a zero denominator to 0 (no change) or infinity
pub(crate) fn safe_ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else if num == 0.0 {
        0.0
    } else {
        f64::INFINITY.copysign(num)
    }
}

/// Relative change of `current` against `baseline` in percent
pub fn percentage_change(baseline: f64, current: f64) -> f64 {
    let delta = current - baseline;
    if baseline == 0.0 {
        // No meaningful relative scale; report direction only.
        return if delta == 0.0 { 0.0 } else { 100.0_f64.copysign(delta) };
    }
    delta / baseline.abs() * 100.0
}

/// Pooled standard deviation of two samples with equal weight
pub fn pooled_std_dev(baseline: &MetricSample, current: &MetricSample) -> f64 {
    ((baseline.std_dev.powi(2) + current.std_dev.powi(2)) / 2.0).sqrt()
}

/// Cohen's d using the absolute mean difference
pub fn effect_size(baseline: &MetricSample, current: &MetricSample) -> f64 {
    safe_ratio(
        (current.mean - baseline.mean).abs(),
        pooled_std_dev(baseline, current),
    )
}

/// Coarse p-value proxy bucketed by effect size.
///
/// Not a statistical test: the engine only stores summaries, so this maps
/// effect-size buckets onto conventional significance levels to give callers
/// an informational confidence indicator.
pub fn approximate_p_value(effect_size: f64) -> f64 {
    match effect_size {
        d if d >= 2.0 => 0.001,
        d if d >= 1.5 => 0.01,
        d if d >= 1.0 => 0.05,
        d if d >= 0.5 => 0.1,
        _ => 0.5,
    }
}

/// 95% confidence interval of a sample mean
pub fn confidence_interval(sample: &MetricSample) -> ConfidenceInterval {
    let n = sample.sample_size.max(1) as f64;
    let margin = Z_95 * sample.std_dev / n.sqrt();
    ConfidenceInterval {
        lower: sample.mean - margin,
        upper: sample.mean + margin,
    }
}

/// Map an absolute change (in percent or points) onto a severity band
pub fn classify(magnitude: f64, thresholds: &SeverityThresholds) -> Severity {
    if magnitude >= thresholds.critical {
        Severity::Critical
    } else if magnitude >= thresholds.warning {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// Compare one metric distribution against its baseline
pub fn compare_metric(
    metric: &str,
    category: MetricCategory,
    baseline: &MetricSample,
    current: &MetricSample,
    thresholds: &SeverityThresholds,
) -> MetricComparison {
    let change = percentage_change(baseline.mean, current.mean);
    let d = effect_size(baseline, current);
    let magnitude = change.abs();

    MetricComparison {
        metric: metric.to_string(),
        category,
        baseline_mean: baseline.mean,
        current_mean: current.mean,
        percentage_change: change,
        pooled_std_dev: pooled_std_dev(baseline, current),
        effect_size: d,
        approximate_p_value: approximate_p_value(d),
        baseline_interval: confidence_interval(baseline),
        current_interval: confidence_interval(current),
        is_significant: magnitude >= thresholds.warning && d >= MIN_EFFECT_SIZE,
        severity: classify(magnitude, thresholds),
    }
}

/// Compare success rates; thresholds are expressed in percentage points
pub fn compare_reliability(
    baseline: &Statistics,
    current: &Statistics,
    thresholds: &SeverityThresholds,
) -> ReliabilityComparison {
    let change = current.success_rate - baseline.success_rate;
    let points = change.abs() * 100.0;

    ReliabilityComparison {
        baseline_success_rate: baseline.success_rate,
        current_success_rate: current.success_rate,
        success_rate_change: change,
        error_rate_change: current.error_rate - baseline.error_rate,
        is_significant: points >= thresholds.warning,
        severity: classify(points, thresholds),
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than two values
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Least-squares slope of `values` against their index
pub fn linear_regression_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;

    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Pearson correlation between index and value; 0 when either side is flat
pub fn pearson_correlation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let mean_x = mean(&xs);
    let mean_y = mean(values);

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(values) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (covariance / denominator).clamp(-1.0, 1.0)
}

/// Coefficient of variation (`std_dev / |mean|`); 0 when the mean is 0
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn performance_thresholds() -> SeverityThresholds {
        SeverityThresholds {
            warning: 15.0,
            critical: 30.0,
        }
    }

    fn stats_with(duration: MetricSample, success_rate: f64) -> Statistics {
        Statistics {
            duration,
            memory: MemoryStatistics {
                heap: MetricSample::new(50.0, 5.0, 30),
            },
            success_rate,
            error_rate: 1.0 - success_rate,
        }
    }

    #[test]
    fn test_duration_regression_scenario() {
        let baseline = MetricSample::new(100.0, 10.0, 30);
        let current = MetricSample::new(135.0, 10.0, 30);

        let cmp = compare_metric(
            "duration",
            MetricCategory::Performance,
            &baseline,
            &current,
            &performance_thresholds(),
        );

        assert!((cmp.percentage_change - 35.0).abs() < 1e-9);
        assert!((cmp.effect_size - 3.5).abs() < 1e-9);
        assert!(cmp.is_significant);
        assert!(cmp.is_degradation());
        assert_eq!(cmp.severity, Severity::Critical);
        assert_eq!(cmp.approximate_p_value, 0.001);
    }

    #[test]
    fn test_small_effect_is_not_significant() {
        // 20% change but huge spread: d = 20 / 80 = 0.25
        let baseline = MetricSample::new(100.0, 80.0, 30);
        let current = MetricSample::new(120.0, 80.0, 30);

        let cmp = compare_metric(
            "duration",
            MetricCategory::Performance,
            &baseline,
            &current,
            &performance_thresholds(),
        );

        assert!(!cmp.is_significant);
        assert_eq!(cmp.severity, Severity::Warning);
    }

    #[test]
    fn test_reliability_drop_is_warning_not_critical() {
        let baseline = stats_with(MetricSample::new(100.0, 10.0, 30), 0.98);
        let current = stats_with(MetricSample::new(100.0, 10.0, 30), 0.90);
        let thresholds = SeverityThresholds {
            warning: 5.0,
            critical: 10.0,
        };

        let cmp = compare_reliability(&baseline, &current, &thresholds);

        assert!((cmp.success_rate_change + 0.08).abs() < 1e-9);
        assert!(cmp.is_significant);
        assert!(cmp.is_degradation());
        assert_eq!(cmp.severity, Severity::Warning);
    }

    #[test]
    fn test_approximate_p_value_buckets() {
        assert_eq!(approximate_p_value(2.5), 0.001);
        assert_eq!(approximate_p_value(1.5), 0.01);
        assert_eq!(approximate_p_value(1.2), 0.05);
        assert_eq!(approximate_p_value(0.5), 0.1);
        assert_eq!(approximate_p_value(0.1), 0.5);
    }

    #[test]
    fn test_confidence_interval_uses_standard_error() {
        let sample = MetricSample::new(100.0, 10.0, 25);
        let ci = confidence_interval(&sample);

        assert!((ci.lower - (100.0 - 1.96 * 2.0)).abs() < 1e-9);
        assert!((ci.upper - (100.0 + 1.96 * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_spread_effect_size() {
        let flat = MetricSample::new(100.0, 0.0, 10);
        let moved = MetricSample::new(110.0, 0.0, 10);

        assert_eq!(effect_size(&flat, &flat), 0.0);
        assert!(effect_size(&flat, &moved).is_infinite());
    }

    #[test]
    fn test_zero_baseline_mean() {
        assert_eq!(percentage_change(0.0, 0.0), 0.0);
        assert_eq!(percentage_change(0.0, 5.0), 100.0);
        assert_eq!(percentage_change(0.0, -5.0), -100.0);
    }

    #[test]
    fn test_sample_validation() {
        assert!(MetricSample::new(1.0, 0.0, 1).validate("x").is_ok());
        assert!(MetricSample::new(1.0, -1.0, 1).validate("x").is_err());
        assert!(MetricSample::new(1.0, 1.0, 0).validate("x").is_err());

        let mut stats = stats_with(MetricSample::new(1.0, 1.0, 1), 0.5);
        assert!(stats.validate().is_ok());
        stats.success_rate = 1.5;
        assert!(stats.validate().is_err());
    }

    #[test]
    fn test_regression_helpers() {
        let rising = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((linear_regression_slope(&rising) - 1.0).abs() < 1e-9);
        assert!((pearson_correlation(&rising) - 1.0).abs() < 1e-9);

        let flat = [3.0, 3.0, 3.0];
        assert_eq!(linear_regression_slope(&flat), 0.0);
        assert_eq!(pearson_correlation(&flat), 0.0);
        assert_eq!(coefficient_of_variation(&flat), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    fn sample_strategy() -> impl Strategy<Value = MetricSample> {
        (1.0f64..10_000.0, 0.1f64..500.0, 1u64..1000)
            .prop_map(|(mean, std_dev, n)| MetricSample::new(mean, std_dev, n))
    }

    proptest! {
        #[test]
        fn prop_identical_samples_show_no_change(sample in sample_strategy()) {
            let cmp = compare_metric(
                "duration",
                MetricCategory::Performance,
                &sample,
                &sample,
                &performance_thresholds(),
            );
            prop_assert_eq!(cmp.percentage_change, 0.0);
            prop_assert_eq!(cmp.effect_size, 0.0);
            prop_assert!(!cmp.is_significant);
        }

        #[test]
        fn prop_percentage_change_sign_matches_delta(
            base in sample_strategy(),
            cur in sample_strategy(),
        ) {
            let change = percentage_change(base.mean, cur.mean);
            let delta = cur.mean - base.mean;
            prop_assert_eq!(change > 0.0, delta > 0.0);
            prop_assert_eq!(change < 0.0, delta < 0.0);
        }

        #[test]
        fn prop_effect_size_is_symmetric(
            base in sample_strategy(),
            cur in sample_strategy(),
        ) {
            let forward = effect_size(&base, &cur);
            let backward = effect_size(&cur, &base);
            prop_assert!((forward - backward).abs() < 1e-9);

            let up = percentage_change(base.mean, cur.mean);
            let down = percentage_change(cur.mean, base.mean);
            prop_assert!(!(up > 0.0 && down > 0.0));
            prop_assert!(!(up < 0.0 && down < 0.0));
        }
    }
}
