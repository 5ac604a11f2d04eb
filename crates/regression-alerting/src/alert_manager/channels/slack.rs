//! Slack incoming-webhook channel (Block Kit payload)

use super::{
    http_client, post_json, recommendation_lines, regression_lines, title, AlertRenderer,
    ChannelMessage, NotificationChannel,
};
use crate::alert_manager::config::SlackConfig;
use crate::alert_manager::types::Alert;
use crate::error::{AlertError, AlertResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Slack webhook channel
pub struct SlackChannel {
    config: SlackConfig,
    client: Client,
}

impl SlackChannel {
    /// Create the channel with its own HTTP client
    pub fn new(config: SlackConfig) -> AlertResult<Self> {
        Ok(Self {
            config,
            client: http_client()?,
        })
    }
}

fn bullet_section(heading: &str, lines: &[String]) -> Value {
    let body: Vec<String> = lines.iter().map(|l| format!("• {}", l)).collect();
    json!({
        "type": "section",
        "text": {
            "type": "mrkdwn",
            "text": format!("*{}*\n{}", heading, body.join("\n")),
        }
    })
}

impl AlertRenderer for SlackChannel {
    fn render(&self, alert: &Alert) -> AlertResult<ChannelMessage> {
        let mut blocks = vec![
            json!({
                "type": "header",
                "text": { "type": "plain_text", "text": title(alert), "emoji": true }
            }),
            json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": alert.summary },
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Environment:*\n{}", alert.environment) },
                    { "type": "mrkdwn", "text": format!("*Severity:*\n{}", alert.severity.as_str().to_uppercase()) },
                    { "type": "mrkdwn", "text": format!("*Alert ID:*\n{}", alert.alert_id) },
                ]
            }),
        ];

        let regressions = regression_lines(alert);
        if !regressions.is_empty() {
            blocks.push(bullet_section("Regressions", &regressions));
        }
        let recommendations = recommendation_lines(alert);
        if !recommendations.is_empty() {
            blocks.push(bullet_section("Recommendations", &recommendations));
        }
        if let Some(url) = &alert.report_url {
            blocks.push(json!({
                "type": "actions",
                "elements": [{
                    "type": "button",
                    "text": { "type": "plain_text", "text": "View Report" },
                    "url": url,
                    "style": "primary",
                }]
            }));
        }

        let mut payload = json!({
            "username": self.config.username,
            "text": format!("{}: {}", title(alert), alert.summary),
            "blocks": blocks,
        });
        if let Some(channel) = &self.config.channel {
            payload["channel"] = json!(channel);
        }

        Ok(ChannelMessage::Json(payload))
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
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
                channel: "slack".to_string(),
                details: "webhook_url not configured".to_string(),
            })?;
        let ChannelMessage::Json(body) = self.render(alert)? else {
            return Err(AlertError::DeliveryFailed {
                channel: "slack".to_string(),
                details: "unexpected message shape".to_string(),
            });
        };
        post_json(&self.client, url, &body, &HashMap::new(), self.config.timeout_ms).await
    }
}
