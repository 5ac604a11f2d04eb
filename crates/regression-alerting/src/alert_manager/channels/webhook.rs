//! Generic HTTP callback channel

use super::{http_client, post_json, AlertRenderer, ChannelMessage, NotificationChannel};
use crate::alert_manager::config::WebhookConfig;
use crate::alert_manager::types::Alert;
use crate::error::{AlertError, AlertResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;

/// POSTs `{type: "performance_alert", data, timestamp}` to a configured URL
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create the channel with its own HTTP client
    pub fn new(config: WebhookConfig) -> AlertResult<Self> {
        Ok(Self {
            config,
            client: http_client()?,
        })
    }
}

impl AlertRenderer for WebhookChannel {
    fn render(&self, alert: &Alert) -> AlertResult<ChannelMessage> {
        Ok(ChannelMessage::Json(json!({
            "type": "performance_alert",
            "data": serde_json::to_value(alert)?,
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.url.is_some()
    }

    async fn send(&self, alert: &Alert) -> AlertResult<()> {
        let url = self
            .config
            .url
            .as_deref()
            .ok_or_else(|| AlertError::DeliveryFailed {
                channel: "webhook".to_string(),
                details: "url not configured".to_string(),
            })?;
        let ChannelMessage::Json(body) = self.render(alert)? else {
            return Err(AlertError::DeliveryFailed {
                channel: "webhook".to_string(),
                details: "unexpected message shape".to_string(),
            });
        };
        post_json(
            &self.client,
            url,
            &body,
            &self.config.headers,
            self.config.timeout_ms,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sample_alert;
    use super::*;
    use crate::alert_manager::types::AlertSeverity;
    use std::collections::HashMap;

    #[test]
    fn test_callback_payload_wraps_alert() {
        let channel = WebhookChannel::new(WebhookConfig::default()).unwrap();
        let ChannelMessage::Json(body) = channel
            .render(&sample_alert(AlertSeverity::Critical))
            .unwrap()
        else {
            panic!("expected json");
        };

        assert_eq!(body["type"], "performance_alert");
        assert_eq!(body["data"]["alertId"], "a1b2c3d4e5f6");
        assert_eq!(body["data"]["type"], "perf_regression");
        assert_eq!(body["data"]["severity"], "critical");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer token123".to_string());
        let channel = WebhookChannel::new(WebhookConfig {
            enabled: true,
            url: Some("http://127.0.0.1:1/hook".to_string()),
            headers,
            timeout_ms: 1_000,
        })
        .unwrap();

        assert!(channel.is_enabled());
        assert!(channel
            .send(&sample_alert(AlertSeverity::Warning))
            .await
            .is_err());
    }
}
