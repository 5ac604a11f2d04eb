//! Trend analysis over a series of duration means

use super::types::{
    Algorithm, AlgorithmDetection, TrendAnalysis, TrendDirection, TrendRisk, TrendSource,
};
use crate::statistics::{
    coefficient_of_variation, linear_regression_slope, mean, pearson_correlation, Severity,
};

/// Slope per step, relative to the series mean, below which a trend is stable
const STABLE_SLOPE_RATIO: f64 = 0.01;
/// Correlation a degrading trend needs to count as a detection
const DEGRADING_CORRELATION: f64 = 0.7;
const HIGH_RISK_CORRELATION: f64 = 0.8;
const MEDIUM_RISK_CORRELATION: f64 = 0.6;
const VOLATILITY_LIMIT: f64 = 0.3;

/// Straight line of `points` values from `from` to `to` inclusive
pub fn interpolate(from: f64, to: f64, points: usize) -> Vec<f64> {
    let points = points.max(2);
    let step = (to - from) / (points - 1) as f64;
    (0..points).map(|i| from + step * i as f64).collect()
}

/// Build the series to analyse.
///
/// A history of at least two points is used as-is with `current` appended as
/// the newest value. Anything shorter falls back to the interpolated mode.
pub fn build_series(
    history: Option<&[f64]>,
    baseline: f64,
    current: f64,
    interpolation_points: usize,
) -> (Vec<f64>, TrendSource) {
    match history {
        Some(values) if values.len() >= 2 => {
            let mut series = values.to_vec();
            series.push(current);
            (series, TrendSource::History)
        }
        _ => (
            interpolate(baseline, current, interpolation_points),
            TrendSource::Interpolated,
        ),
    }
}

/// Classify direction, correlation, volatility and risk of a series
pub fn analyze_series(series: &[f64], source: TrendSource) -> TrendAnalysis {
    let slope = linear_regression_slope(series);
    let correlation = pearson_correlation(series);
    let volatility = coefficient_of_variation(series);

    let scale = mean(series).abs();
    let relative_slope = if scale > 0.0 { slope / scale } else { slope };

    let direction = if relative_slope.abs() < STABLE_SLOPE_RATIO {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Degrading
    } else {
        TrendDirection::Improving
    };

    let degrading = direction == TrendDirection::Degrading;
    let risk = if degrading && correlation > HIGH_RISK_CORRELATION {
        TrendRisk::High
    } else if (degrading && correlation > MEDIUM_RISK_CORRELATION)
        || volatility > VOLATILITY_LIMIT
    {
        TrendRisk::Medium
    } else {
        TrendRisk::Low
    };

    TrendAnalysis {
        source,
        points: series.len(),
        direction,
        slope,
        correlation,
        volatility,
        is_degrading_trend: degrading && correlation > DEGRADING_CORRELATION,
        risk,
    }
}

/// Detection entry for a degrading trend; confidence is the correlation
pub fn detection(analysis: &TrendAnalysis) -> Option<AlgorithmDetection> {
    analysis.is_degrading_trend.then(|| AlgorithmDetection {
        algorithm: Algorithm::Trend,
        confidence: analysis.correlation.clamp(0.0, 1.0),
        severity: Severity::Warning,
    })
}
