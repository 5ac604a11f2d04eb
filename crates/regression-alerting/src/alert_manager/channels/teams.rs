//! Microsoft Teams incoming-webhook channel (MessageCard payload)

use super::{
    http_client, post_json, recommendation_lines, regression_lines, title, AlertRenderer,
    ChannelMessage, NotificationChannel,
};
use crate::alert_manager::config::TeamsConfig;
use crate::alert_manager::types::Alert;
use crate::error::{AlertError, AlertResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::collections::HashMap;

/// Teams webhook channel
pub struct TeamsChannel {
    config: TeamsConfig,
    client: Client,
}

impl TeamsChannel {
    /// Create the channel with its own HTTP client
    pub fn new(config: TeamsConfig) -> AlertResult<Self> {
        Ok(Self {
            config,
            client: http_client()?,
        })
    }
}

impl AlertRenderer for TeamsChannel {
    fn render(&self, alert: &Alert) -> AlertResult<ChannelMessage> {
        let mut sections = vec![json!({
            "activityTitle": title(alert),
            "activitySubtitle": alert.summary,
            "facts": [
                { "name": "Environment", "value": alert.environment },
                { "name": "Severity", "value": alert.severity.as_str().to_uppercase() },
                { "name": "Alert ID", "value": alert.alert_id },
                { "name": "Time", "value": alert.timestamp.to_rfc3339() },
            ],
            "markdown": true,
        })];

        let regressions = regression_lines(alert);
        if !regressions.is_empty() {
            sections.push(json!({
                "title": "Regressions",
                "text": regressions.iter().map(|l| format!("- {}", l)).collect::<Vec<_>>().join("\n\n"),
            }));
        }
        let recommendations = recommendation_lines(alert);
        if !recommendations.is_empty() {
            sections.push(json!({
                "title": "Recommendations",
                "text": recommendations.iter().map(|l| format!("- {}", l)).collect::<Vec<_>>().join("\n\n"),
            }));
        }

        let mut card = json!({
            "@type": "MessageCard",
            "@context": "https://schema.org/extensions",
            "themeColor": alert.severity.color().trim_start_matches('#'),
            "summary": alert.summary,
            "title": title(alert),
            "sections": sections,
        });
        if let Some(url) = &alert.report_url {
            card["potentialAction"] = json!([{
                "@type": "OpenUri",
                "name": "View Report",
                "targets": [{ "os": "default", "uri": url }],
            }]);
        }

        Ok(ChannelMessage::Json(card))
    }
}

#[async_trait]
impl NotificationChannel for TeamsChannel {
    fn name(&self) -> &str {
        "teams"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.webhook_url.is_some()
    }

    async fn send(&self, alert: &Alert) -> AlertResult<()> {
        let url = self
            .config
            .webhook_url
            .as_deref()
            .ok_or_else(|| AlertError::DeliveryFailed {
                channel: "teams".to_string(),
                details: "webhook_url not configured".to_string(),
            })?;
        let ChannelMessage::Json(body) = self.render(alert)? else {
            return Err(AlertError::DeliveryFailed {
                channel: "teams".to_string(),
                details: "unexpected message shape".to_string(),
            });
        };
        post_json(&self.client, url, &body, &HashMap::new(), self.config.timeout_ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sample_alert;
    use super::*;
    use crate::alert_manager::types::AlertSeverity;

    #[test]
    fn test_message_card_shape() {
        let channel = TeamsChannel::new(TeamsConfig::default()).unwrap();
        let ChannelMessage::Json(card) = channel
            .render(&sample_alert(AlertSeverity::Warning))
            .unwrap()
        else {
            panic!("expected json");
        };

        assert_eq!(card["@type"], "MessageCard");
        assert_eq!(card["themeColor"], "fd7e14");
        assert_eq!(card["sections"].as_array().unwrap().len(), 3);
        assert_eq!(card["sections"][0]["facts"][0]["value"], "staging");
        assert_eq!(card["potentialAction"][0]["name"], "View Report");
    }
}
