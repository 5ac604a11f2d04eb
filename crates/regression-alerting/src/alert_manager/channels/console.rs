//! Console sink, always available locally

use super::{recommendation_lines, regression_lines, AlertRenderer, ChannelMessage, NotificationChannel};
use crate::alert_manager::config::ConsoleConfig;
use crate::alert_manager::types::{Alert, AlertSeverity};
use crate::error::{AlertError, AlertResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Write;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

fn ansi(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Info => "\x1b[36m",
        AlertSeverity::Warning => "\x1b[33m",
        AlertSeverity::Critical => "\x1b[31m",
    }
}

/// Writes alerts to stdout or an injected writer
pub struct ConsoleChannel {
    config: ConsoleConfig,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleChannel {
    /// Console channel writing to stdout
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_writer(config, Box::new(std::io::stdout()))
    }

    /// Console channel writing to `out`
    pub fn with_writer(config: ConsoleConfig, out: Box<dyn Write + Send>) -> Self {
        Self {
            config,
            out: Mutex::new(out),
        }
    }
}

impl AlertRenderer for ConsoleChannel {
    fn render(&self, alert: &Alert) -> AlertResult<ChannelMessage> {
        let (color, bold, reset) = if self.config.colored {
            (ansi(alert.severity), BOLD, RESET)
        } else {
            ("", "", "")
        };

        let rule = "=".repeat(60);
        let mut text = String::new();
        text.push_str(&format!("{color}{rule}{reset}\n"));
        text.push_str(&format!(
            "{color}{bold}{} PERFORMANCE ALERT [{}]{reset}\n",
            alert.severity.emoji(),
            alert.severity.as_str().to_uppercase()
        ));
        text.push_str(&format!("{color}{rule}{reset}\n"));
        text.push_str(&format!("Alert ID:    {}\n", alert.alert_id));
        text.push_str(&format!("Type:        {}\n", alert.alert_type));
        text.push_str(&format!("Environment: {}\n", alert.environment));
        text.push_str(&format!("Time:        {}\n", alert.timestamp.to_rfc3339()));
        text.push_str(&format!("Summary:     {}\n", alert.summary));

        let regressions = regression_lines(alert);
        if !regressions.is_empty() {
            text.push_str(&format!("\n{bold}Regressions:{reset}\n"));
            for line in regressions {
                text.push_str(&format!("  - {}\n", line));
            }
        }

        let recommendations = recommendation_lines(alert);
        if !recommendations.is_empty() {
            text.push_str(&format!("\n{bold}Recommendations:{reset}\n"));
            for line in recommendations {
                text.push_str(&format!("  - {}\n", line));
            }
        }
        text.push_str(&format!("{color}{rule}{reset}\n"));

        Ok(ChannelMessage::Text(text))
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn send(&self, alert: &Alert) -> AlertResult<()> {
        let ChannelMessage::Text(text) = self.render(alert)? else {
            return Err(AlertError::DeliveryFailed {
                channel: "console".to_string(),
                details: "unexpected message shape".to_string(),
            });
        };

        let mut out = self.out.lock();
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| AlertError::DeliveryFailed {
                channel: "console".to_string(),
                details: e.to_string(),
            })
    }
}
