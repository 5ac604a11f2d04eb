//! Alert manager and notification channel configuration

use super::history::DEFAULT_HISTORY_CAPACITY;
use super::rate_limit::WINDOW_MINUTES;
use crate::error::{RegressionError, RegressionResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alert manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertManagerConfig {
    /// Maximum dispatched alerts in any trailing hour
    pub max_alerts_per_hour: usize,
    /// Window during which a repeated type/environment alert is dropped.
    ///
    /// At most [`WINDOW_MINUTES`]: rate-limit timestamps are pruned after one
    /// hour, so a longer window could never match.
    pub duplicate_suppression_minutes: u64,
    /// Alert history ring buffer size
    pub history_capacity: usize,
    /// Environment used when a payload carries none
    pub default_environment: String,
    /// Notification channels
    pub channels: ChannelsConfig,
}

impl Default for AlertManagerConfig {
    fn default() -> Self {
        Self {
            max_alerts_per_hour: 10,
            duplicate_suppression_minutes: 30,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_environment: "unknown".to_string(),
            channels: ChannelsConfig::default(),
        }
    }
}

impl AlertManagerConfig {
    /// Reject zero limits and enabled channels without an endpoint
    pub fn validate(&self) -> RegressionResult<()> {
        if self.max_alerts_per_hour == 0 {
            return Err(RegressionError::ConfigurationError {
                parameter: "max_alerts_per_hour".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.duplicate_suppression_minutes > WINDOW_MINUTES {
            return Err(RegressionError::ConfigurationError {
                parameter: "duplicate_suppression_minutes".to_string(),
                message: format!(
                    "must be at most {} minutes, got {}",
                    WINDOW_MINUTES, self.duplicate_suppression_minutes
                ),
            });
        }
        if self.history_capacity == 0 {
            return Err(RegressionError::ConfigurationError {
                parameter: "history_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let email = &self.channels.email;
        if email.enabled && (email.smtp_host.is_empty() || email.to.is_empty()) {
            return Err(RegressionError::ConfigurationError {
                parameter: "channels.email".to_string(),
                message: "enabled email channel needs smtp_host and at least one recipient"
                    .to_string(),
            });
        }
        for (name, enabled, url) in [
            ("slack", self.channels.slack.enabled, &self.channels.slack.webhook_url),
            ("teams", self.channels.teams.enabled, &self.channels.teams.webhook_url),
            ("webhook", self.channels.webhook.enabled, &self.channels.webhook.url),
        ] {
            if enabled && url.as_deref().map_or(true, str::is_empty) {
                return Err(RegressionError::ConfigurationError {
                    parameter: format!("channels.{}", name),
                    message: "enabled channel needs a URL".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration of every built-in channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Local console sink
    pub console: ConsoleConfig,
    /// SMTP email
    pub email: EmailConfig,
    /// Slack incoming webhook
    pub slack: SlackConfig,
    /// Microsoft Teams incoming webhook
    pub teams: TeamsConfig,
    /// Generic HTTP callback
    pub webhook: WebhookConfig,
}

/// Console channel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Channel enabled
    pub enabled: bool,
    /// Emit ANSI colors
    pub colored: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// SMTP email channel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Channel enabled
    pub enabled: bool,
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP port
    pub smtp_port: u16,
    /// Use STARTTLS; plain connection otherwise
    pub starttls: bool,
    /// SMTP user
    pub username: Option<String>,
    /// SMTP password
    pub password: Option<String>,
    /// Sender mailbox
    pub from: String,
    /// Recipient mailboxes
    pub to: Vec<String>,
    /// Connection and send timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            starttls: true,
            username: None,
            password: None,
            from: "performance-alerts@localhost".to_string(),
            to: Vec::new(),
            timeout_ms: 10_000,
        }
    }
}

/// Slack webhook settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Channel enabled
    pub enabled: bool,
    /// Incoming webhook URL
    pub webhook_url: Option<String>,
    /// Channel override, e.g. `#perf-alerts`
    pub channel: Option<String>,
    /// Bot display name
    pub username: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            channel: None,
            username: "Performance Monitor".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Microsoft Teams webhook settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamsConfig {
    /// Channel enabled
    pub enabled: bool,
    /// Incoming webhook URL
    pub webhook_url: Option<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            timeout_ms: 10_000,
        }
    }
}

/// Generic HTTP callback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Channel enabled
    pub enabled: bool,
    /// Callback URL
    pub url: Option<String>,
    /// Extra request headers
    pub headers: HashMap<String, String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            headers: HashMap::new(),
            timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_manager_config_default() {
        let config = AlertManagerConfig::default();

        assert_eq!(config.max_alerts_per_hour, 10);
        assert_eq!(config.duplicate_suppression_minutes, 30);
        assert_eq!(config.history_capacity, 1000);
        assert!(config.channels.console.enabled);
        assert!(!config.channels.email.enabled);
        assert_eq!(config.channels.webhook.timeout_ms, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_channel_without_url_is_rejected() {
        let mut config = AlertManagerConfig::default();
        config.channels.slack.enabled = true;
        assert!(config.validate().is_err());

        config.channels.slack.webhook_url = Some("https://hooks.slack.com/services/x".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_suppression_window_is_bounded_by_prune_horizon() {
        let mut config = AlertManagerConfig {
            duplicate_suppression_minutes: 60,
            ..AlertManagerConfig::default()
        };
        assert!(config.validate().is_ok());

        config.duplicate_suppression_minutes = 61;
        assert!(config.validate().is_err());

        config.duplicate_suppression_minutes = i64::MAX as u64;
        assert!(matches!(
            config.validate(),
            Err(RegressionError::ConfigurationError { parameter, .. })
                if parameter == "duplicate_suppression_minutes"
        ));
    }

    #[test]
    fn test_zero_hourly_cap_is_rejected() {
        let config = AlertManagerConfig {
            max_alerts_per_hour: 0,
            ..AlertManagerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
