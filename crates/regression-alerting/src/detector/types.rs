//! Result types produced by the regression detector

use crate::statistics::{
    Baseline, MetricComparison, ReliabilityComparison, Severity, Statistics,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Detection algorithm identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Statistical significance (effect size + thresholds)
    Statistical,
    /// Trend over a history window
    Trend,
    /// CUSUM and mean-shift ratio
    ChangePoint,
    /// Z-score, IQR and modified Z-score
    Anomaly,
}

impl Algorithm {
    /// snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Statistical => "statistical",
            Algorithm::Trend => "trend",
            Algorithm::ChangePoint => "change_point",
            Algorithm::Anomaly => "anomaly",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the statistical significance test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalAnalysis {
    /// Duration comparison (performance thresholds)
    pub duration: MetricComparison,
    /// Heap comparison (memory thresholds)
    pub memory: MetricComparison,
    /// Success-rate comparison (reliability thresholds)
    pub reliability: ReliabilityComparison,
}

impl StatisticalAnalysis {
    /// Metric comparisons that are significant degradations
    pub fn degraded_metrics(&self) -> impl Iterator<Item = &MetricComparison> {
        [&self.duration, &self.memory]
            .into_iter()
            .filter(|m| m.is_degradation())
    }

    /// Any significant degradation, reliability included
    pub fn has_regression(&self) -> bool {
        self.degraded_metrics().next().is_some() || self.reliability.is_degradation()
    }
}

/// Direction of a trend in a duration series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Values grow (slower)
    Degrading,
    /// Values shrink (faster)
    Improving,
    /// No meaningful slope
    Stable,
}

/// Risk classification of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendRisk {
    /// Nothing to watch
    Low,
    /// Degrading with moderate correlation, or volatile
    Medium,
    /// Degrading with strong correlation
    High,
}

/// Where the trend series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSource {
    /// Caller-supplied history of duration means
    History,
    /// Degraded mode: straight line between baseline and current. The
    /// direction then only mirrors the baseline→current delta.
    Interpolated,
}

/// Output of trend analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    /// Series origin
    pub source: TrendSource,
    /// Number of points analysed
    pub points: usize,
    /// Trend direction
    pub direction: TrendDirection,
    /// Least-squares slope per step
    pub slope: f64,
    /// Pearson correlation of index vs value
    pub correlation: f64,
    /// Coefficient of variation of the series
    pub volatility: f64,
    /// Degrading with correlation above 0.7
    pub is_degrading_trend: bool,
    /// Risk classification
    pub risk: TrendRisk,
}

/// CUSUM sub-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CusumTest {
    /// `|Δmean|`
    pub drift: f64,
    /// `2 * baseline.std_dev`
    pub threshold: f64,
    /// `max(0, drift - threshold)`
    pub cumulative_sum: f64,
    /// `cumulative_sum > threshold`
    pub detected: bool,
    /// Normalized score in [0, 1]
    pub score: f64,
}

/// Mean-shift significance sub-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeanShiftTest {
    /// `|Δmean| / baseline.std_dev`
    pub ratio: f64,
    /// `ratio > threshold`
    pub detected: bool,
    /// Normalized score in [0, 1]
    pub score: f64,
}

/// Output of change-point detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePointAnalysis {
    /// CUSUM sub-test
    pub cusum: CusumTest,
    /// Mean-shift ratio sub-test
    pub mean_shift: MeanShiftTest,
    /// Either sub-test fired
    pub has_change_point: bool,
    /// Max of the two normalized scores
    pub confidence: f64,
    /// Current mean above baseline
    pub is_increase: bool,
}

/// One anomaly estimator verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatorResult {
    /// Estimator statistic
    pub score: f64,
    /// Statistic crossed its threshold
    pub is_anomaly: bool,
}

/// IQR estimator verdict with the approximated fences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IqrResult {
    /// Lower fence `q1 - 1.5 * iqr`
    pub lower_fence: f64,
    /// Upper fence `q3 + 1.5 * iqr`
    pub upper_fence: f64,
    /// Current mean outside the fences
    pub is_anomaly: bool,
}

/// Output of anomaly detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAnalysis {
    /// `|Δmean| / baseline.std_dev`
    pub z_score: EstimatorResult,
    /// Quartiles approximated from `mean ± std_dev`
    pub iqr: IqrResult,
    /// Median-based modified Z-score
    pub modified_z_score: EstimatorResult,
    /// Any estimator fired
    pub is_anomaly: bool,
    /// Max of the normalized estimator scores
    pub confidence: f64,
    /// Current mean above baseline
    pub is_increase: bool,
}

/// Per-algorithm outputs; `None` when the algorithm is disabled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmResults {
    /// Statistical significance
    pub statistical: Option<StatisticalAnalysis>,
    /// Trend analysis
    pub trend: Option<TrendAnalysis>,
    /// Change-point detection
    pub change_point: Option<ChangePointAnalysis>,
    /// Anomaly detection
    pub anomaly: Option<AnomalyAnalysis>,
}

/// One fired algorithm, as fed to the merge step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmDetection {
    /// Which algorithm fired
    pub algorithm: Algorithm,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Severity the algorithm assigned
    pub severity: Severity,
}

/// Recommendation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    /// Critical regression needs attention now
    ImmediateAction,
    /// Duration regressed
    PerformanceOptimization,
    /// Heap usage regressed
    MemoryOptimization,
    /// Trend is degrading
    Monitoring,
    /// Improvement: refresh the baseline
    Documentation,
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

/// Suggested follow-up for operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Category of action
    pub category: RecommendationCategory,
    /// Priority
    pub priority: Priority,
    /// Human-readable text
    pub message: String,
}

/// Full detector output for one environment/test-suite pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Test suite name
    pub test_suite: String,
    /// Environment name
    pub environment: String,
    /// When the analysis was produced
    pub timestamp: DateTime<Utc>,
    /// Baseline compared against
    pub baseline: Baseline,
    /// Current run statistics
    pub current: Statistics,
    /// Per-algorithm results
    pub algorithms: AlgorithmResults,
    /// At least one algorithm fired
    pub is_regression: bool,
    /// A significant metric improved beyond the improvement threshold
    pub is_improvement: bool,
    /// Max severity over fired algorithms
    pub severity: Severity,
    /// Mean confidence over fired algorithms (0 if none)
    pub confidence: f64,
    /// Algorithms that fired, in evaluation order
    pub detecting_algorithms: Vec<Algorithm>,
    /// One-line summary
    pub summary: String,
    /// Recommendations in insertion order
    pub recommendations: Vec<Recommendation>,
}

impl Analysis {
    /// Duration comparison, when the statistical test ran
    pub fn duration_comparison(&self) -> Option<&MetricComparison> {
        self.algorithms.statistical.as_ref().map(|s| &s.duration)
    }
}

/// Reason reported when detection cannot run
pub const SKIPPED_REASON: &str = "no baseline or invalid current result";

/// Outcome of one detector call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detection {
    /// Inputs were usable and all enabled algorithms ran
    Analyzed(Box<Analysis>),
    /// Missing baseline or current statistics
    #[serde(rename_all = "camelCase")]
    Skipped {
        /// Always `false`
        has_regression: bool,
        /// Why detection did not run
        reason: String,
    },
}

impl Detection {
    pub(crate) fn skipped() -> Self {
        Detection::Skipped {
            has_regression: false,
            reason: SKIPPED_REASON.to_string(),
        }
    }

    /// True for an analysis that found a regression
    pub fn has_regression(&self) -> bool {
        match self {
            Detection::Analyzed(analysis) => analysis.is_regression,
            Detection::Skipped { .. } => false,
        }
    }

    /// The analysis, if detection ran
    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            Detection::Analyzed(analysis) => Some(analysis),
            Detection::Skipped { .. } => None,
        }
    }

    /// Consume into the analysis, if detection ran
    pub fn into_analysis(self) -> Option<Analysis> {
        match self {
            Detection::Analyzed(analysis) => Some(*analysis),
            Detection::Skipped { .. } => None,
        }
    }
}
