//! Alert payloads, enriched alerts and dispatch outcomes

use crate::detector::{Analysis, Recommendation};
use crate::statistics::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Alert severity levels
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational alert
    #[default]
    Info,
    /// Warning alert
    Warning,
    /// Critical alert
    Critical,
}

impl AlertSeverity {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }

    /// Hex color used by rich channels
    pub fn color(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "#17a2b8",
            AlertSeverity::Warning => "#fd7e14",
            AlertSeverity::Critical => "#dc3545",
        }
    }

    /// Emoji prefix used by text channels
    pub fn emoji(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "ℹ️",
            AlertSeverity::Warning => "⚠️",
            AlertSeverity::Critical => "🚨",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for AlertSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Normal => AlertSeverity::Info,
            Severity::Warning => AlertSeverity::Warning,
            Severity::Critical => AlertSeverity::Critical,
        }
    }
}

/// One regressed metric bundled into an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionEntry {
    /// Test suite
    pub test_suite: String,
    /// Environment
    pub environment: String,
    /// Metric name
    pub metric: String,
    /// Relative change in percent
    pub percentage_change: f64,
    /// Severity of this entry
    pub severity: Severity,
}

/// Caller-built alert request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    /// Alert type, e.g. `perf_regression`
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Overall severity
    pub severity: AlertSeverity,
    /// Environment; defaulted during enrichment
    #[serde(default)]
    pub environment: Option<String>,
    /// Regressions in this alert
    #[serde(default)]
    pub regressions: Vec<RegressionEntry>,
    /// Recommendations in this alert
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Summary; synthesized during enrichment when absent
    #[serde(default)]
    pub summary: Option<String>,
    /// Event time; defaulted to now during enrichment
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Link to a rendered report, shown as an action where supported
    #[serde(default)]
    pub report_url: Option<String>,
}

impl AlertPayload {
    /// Bundle every regressing or improving analysis into one payload.
    ///
    /// Returns `None` when nothing is worth alerting about. The alert type is
    /// `perf_regression` when any analysis regressed, otherwise
    /// `performance_improvement`. Recommendations are deduplicated by
    /// category, keeping the first occurrence.
    pub fn from_analyses<'a, I>(analyses: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Analysis>,
    {
        let relevant: Vec<&Analysis> = analyses
            .into_iter()
            .filter(|a| a.is_regression || a.is_improvement)
            .collect();
        if relevant.is_empty() {
            return None;
        }

        let any_regression = relevant.iter().any(|a| a.is_regression);
        let severity = relevant
            .iter()
            .filter(|a| a.is_regression)
            .map(|a| AlertSeverity::from(a.severity))
            .max()
            .unwrap_or_default();

        let mut regressions = Vec::new();
        let mut recommendations = Vec::new();
        let mut seen = HashSet::new();
        let mut environments = Vec::new();

        for analysis in relevant.iter().filter(|a| a.is_regression) {
            regressions.extend(regression_entries(analysis));
        }
        for analysis in &relevant {
            if !environments.contains(&analysis.environment) {
                environments.push(analysis.environment.clone());
            }
            for rec in &analysis.recommendations {
                if seen.insert(rec.category) {
                    recommendations.push(rec.clone());
                }
            }
        }

        let environment = match environments.as_slice() {
            [single] => Some(single.clone()),
            _ => None,
        };

        Some(Self {
            alert_type: if any_regression {
                "perf_regression".to_string()
            } else {
                "performance_improvement".to_string()
            },
            severity,
            environment,
            regressions,
            recommendations,
            summary: None,
            timestamp: None,
            report_url: None,
        })
    }
}

fn regression_entries(analysis: &Analysis) -> Vec<RegressionEntry> {
    let entry = |metric: &str, percentage_change: f64, severity: Severity| RegressionEntry {
        test_suite: analysis.test_suite.clone(),
        environment: analysis.environment.clone(),
        metric: metric.to_string(),
        percentage_change,
        severity,
    };

    let mut entries = Vec::new();
    if let Some(stats) = &analysis.algorithms.statistical {
        for metric in stats.degraded_metrics() {
            entries.push(entry(&metric.metric, metric.percentage_change, metric.severity));
        }
        if stats.reliability.is_degradation() {
            entries.push(entry(
                "success_rate",
                stats.reliability.success_rate_change * 100.0,
                stats.reliability.severity,
            ));
        }
    }

    if entries.is_empty() {
        // Flagged by trend/change-point/anomaly only
        let change = analysis
            .duration_comparison()
            .map(|d| d.percentage_change)
            .unwrap_or_else(|| {
                crate::statistics::percentage_change(
                    analysis.baseline.statistics.duration.mean,
                    analysis.current.duration.mean,
                )
            });
        entries.push(entry("duration", change, analysis.severity));
    }
    entries
}

/// Enriched, immutable alert handed to channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Short hash identifier
    pub alert_id: String,
    /// Alert type
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Severity
    pub severity: AlertSeverity,
    /// Environment (defaulted)
    pub environment: String,
    /// Regressions
    pub regressions: Vec<RegressionEntry>,
    /// Recommendations
    pub recommendations: Vec<Recommendation>,
    /// Summary (synthesized when absent)
    pub summary: String,
    /// Event time (defaulted)
    pub timestamp: DateTime<Utc>,
    /// Report link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
}

/// Result of one `send_alert` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchResult {
    /// Suppressed by the hourly cap or duplicate window; not an error
    RateLimited {
        /// Always `false`
        success: bool,
        /// Always `"rate_limited"`
        reason: String,
    },
    /// Channels were attempted
    Dispatched {
        /// At least one channel delivered
        success: bool,
        /// Channels that delivered
        channels: Vec<String>,
        /// `"{channel}: {error}"` for channels that failed
        errors: Vec<String>,
        /// Identifier of the dispatched alert
        #[serde(rename = "alertId")]
        alert_id: String,
    },
}

/// Reason string for suppressed alerts
pub const RATE_LIMITED_REASON: &str = "rate_limited";

impl DispatchResult {
    pub(crate) fn rate_limited() -> Self {
        DispatchResult::RateLimited {
            success: false,
            reason: RATE_LIMITED_REASON.to_string(),
        }
    }

    /// At least one channel delivered
    pub fn success(&self) -> bool {
        match self {
            DispatchResult::RateLimited { .. } => false,
            DispatchResult::Dispatched { success, .. } => *success,
        }
    }

    /// Suppressed by rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DispatchResult::RateLimited { .. })
    }

    /// Delivered channel names
    pub fn channels(&self) -> &[String] {
        match self {
            DispatchResult::RateLimited { .. } => &[],
            DispatchResult::Dispatched { channels, .. } => channels,
        }
    }

    /// Channel failure reasons
    pub fn errors(&self) -> &[String] {
        match self {
            DispatchResult::RateLimited { .. } => &[],
            DispatchResult::Dispatched { errors, .. } => errors,
        }
    }
}

/// Compact record of a dispatched alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertHistoryEntry {
    /// Dispatch time
    pub timestamp: DateTime<Utc>,
    /// Alert identifier
    pub alert_id: String,
    /// Alert type
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Severity
    pub severity: AlertSeverity,
    /// Environment
    pub environment: String,
    /// Number of bundled regressions
    pub regression_count: usize,
}

impl AlertHistoryEntry {
    /// Project an alert dispatched at `at`
    pub fn recorded(alert: &Alert, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            alert_id: alert.alert_id.clone(),
            alert_type: alert.alert_type.clone(),
            severity: alert.severity,
            environment: alert.environment.clone(),
            regression_count: alert.regressions.len(),
        }
    }
}

/// Aggregates over the alert history buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    /// Entries in the buffer
    pub total: usize,
    /// Entries from the last 24 hours
    pub last_24_hours: usize,
    /// Entries from the last 7 days
    pub last_7_days: usize,
    /// Count per alert type
    pub by_type: BTreeMap<String, usize>,
    /// Count per severity
    pub by_severity: BTreeMap<AlertSeverity, usize>,
    /// Count per environment
    pub by_environment: BTreeMap<String, usize>,
}
