//! Notification channels
//!
//! Every channel renders the same enriched [`Alert`] into its own message
//! shape through [`AlertRenderer`] and delivers it through
//! [`NotificationChannel`]. Disabled or unconfigured channels decline instead
//! of failing.

mod console;
mod email;
mod slack;
mod teams;
mod webhook;

pub use console::ConsoleChannel;
pub use email::EmailChannel;
pub use slack::SlackChannel;
pub use teams::TeamsChannel;
pub use webhook::WebhookChannel;

use super::types::Alert;
use crate::error::{AlertError, AlertResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Reason reported by channels that are switched off or missing settings
pub const DECLINED_REASON: &str = "disabled_or_not_configured";

/// Channel-specific representation of an alert
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    /// Plain or ANSI-colored text block
    Text(String),
    /// Email with HTML and plain-text alternatives
    Email {
        /// Subject line
        subject: String,
        /// HTML body with inline styling
        html: String,
        /// Plain-text body
        text: String,
    },
    /// JSON document posted to an HTTP endpoint
    Json(serde_json::Value),
}

/// Render an alert into a channel message
pub trait AlertRenderer {
    /// Build this channel's representation of `alert`
    fn render(&self, alert: &Alert) -> AlertResult<ChannelMessage>;
}

/// A destination alerts can be delivered to
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable channel name used in dispatch results
    fn name(&self) -> &str;

    /// Whether the channel is enabled and fully configured
    fn is_enabled(&self) -> bool;

    /// Deliver one alert
    async fn send(&self, alert: &Alert) -> AlertResult<()>;
}

/// Outcome of offering an alert to one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// Delivered
    Delivered {
        /// Channel name
        channel: String,
    },
    /// Disabled or unconfigured; not an error
    Declined {
        /// Channel name
        channel: String,
        /// Always [`DECLINED_REASON`]
        reason: String,
    },
    /// Raised an error or timed out
    Failed {
        /// Channel name
        channel: String,
        /// Error text
        error: String,
    },
}

/// Build the shared HTTP client used by webhook-style channels
pub(crate) fn http_client() -> AlertResult<Client> {
    Ok(Client::builder()
        .user_agent(concat!("regression-alerting/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// POST a JSON body with an explicit timeout, mapping non-2xx to an error
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    body: &serde_json::Value,
    headers: &HashMap<String, String>,
    timeout_ms: u64,
) -> AlertResult<()> {
    let mut request = client
        .post(url)
        .timeout(Duration::from_millis(timeout_ms))
        .json(body);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            AlertError::Timeout { timeout_ms }
        } else {
            AlertError::Http(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AlertError::HttpStatus {
            endpoint: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// `- suite (env): metric +12.3% [warning]` lines, one per regression
pub(crate) fn regression_lines(alert: &Alert) -> Vec<String> {
    alert
        .regressions
        .iter()
        .map(|r| {
            format!(
                "{} ({}): {} {:+.1}% [{}]",
                r.test_suite, r.environment, r.metric, r.percentage_change, r.severity
            )
        })
        .collect()
}

/// Recommendation messages in order
pub(crate) fn recommendation_lines(alert: &Alert) -> Vec<String> {
    alert
        .recommendations
        .iter()
        .map(|r| r.message.clone())
        .collect()
}

/// Human-readable title shared by rich channels
pub(crate) fn title(alert: &Alert) -> String {
    format!(
        "{} Performance Alert: {} ({})",
        alert.severity.emoji(),
        alert.alert_type,
        alert.environment
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::super::types::{Alert, AlertSeverity, RegressionEntry};
    use crate::detector::{Priority, Recommendation, RecommendationCategory};
    use crate::statistics::Severity;
    use chrono::{TimeZone, Utc};

    pub fn sample_alert(severity: AlertSeverity) -> Alert {
        Alert {
            alert_id: "a1b2c3d4e5f6".to_string(),
            alert_type: "perf_regression".to_string(),
            severity,
            environment: "staging".to_string(),
            regressions: vec![
                RegressionEntry {
                    test_suite: "api".to_string(),
                    environment: "staging".to_string(),
                    metric: "duration".to_string(),
                    percentage_change: 35.0,
                    severity: Severity::Critical,
                },
                RegressionEntry {
                    test_suite: "worker".to_string(),
                    environment: "staging".to_string(),
                    metric: "memory.heap".to_string(),
                    percentage_change: 22.5,
                    severity: Severity::Warning,
                },
            ],
            recommendations: vec![Recommendation {
                category: RecommendationCategory::ImmediateAction,
                priority: Priority::High,
                message: "Investigate recent changes".to_string(),
            }],
            summary: "2 performance regression(s) detected (1 critical, 1 warning)".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            report_url: Some("https://ci.example.com/report/42".to_string()),
        }
    }
}
