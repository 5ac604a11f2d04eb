//! SMTP email channel
//!
//! The transport is verified once when the channel is built. A failed
//! verification disables the channel for the manager's lifetime.

use super::{recommendation_lines, regression_lines, title, AlertRenderer, ChannelMessage, NotificationChannel};
use crate::alert_manager::config::EmailConfig;
use crate::alert_manager::types::Alert;
use crate::error::{AlertError, AlertResult};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

type Transport = AsyncSmtpTransport<Tokio1Executor>;

/// Email channel backed by an async SMTP transport
pub struct EmailChannel {
    config: EmailConfig,
    transport: Option<Transport>,
    verified: AtomicBool,
}

impl EmailChannel {
    /// Build the transport and verify it once.
    ///
    /// Never fails: an unbuildable or unreachable transport yields a channel
    /// that always declines.
    pub async fn connect(config: EmailConfig) -> Self {
        if !config.enabled {
            return Self::disabled(config);
        }

        let transport = match build_transport(&config) {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Email transport could not be built, disabling channel: {}", e);
                return Self::disabled(config);
            }
        };

        let verified = match transport.test_connection().await {
            Ok(true) => {
                info!("Email transport verified: {}:{}", config.smtp_host, config.smtp_port);
                true
            }
            Ok(false) => {
                warn!(
                    "Email transport {}:{} rejected verification, disabling channel",
                    config.smtp_host, config.smtp_port
                );
                false
            }
            Err(e) => {
                warn!(
                    "Email transport {}:{} unreachable, disabling channel: {}",
                    config.smtp_host, config.smtp_port, e
                );
                false
            }
        };

        Self {
            config,
            transport: Some(transport),
            verified: AtomicBool::new(verified),
        }
    }

    fn disabled(config: EmailConfig) -> Self {
        Self {
            config,
            transport: None,
            verified: AtomicBool::new(false),
        }
    }
}

fn build_transport(config: &EmailConfig) -> AlertResult<Transport> {
    let builder = if config.starttls {
        Transport::starttls_relay(&config.smtp_host)?
    } else {
        Transport::builder_dangerous(&config.smtp_host)
    };

    let mut builder = builder
        .port(config.smtp_port)
        .timeout(Some(Duration::from_millis(config.timeout_ms)));

    if let (Some(user), Some(password)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    Ok(builder.build())
}

impl AlertRenderer for EmailChannel {
    fn render(&self, alert: &Alert) -> AlertResult<ChannelMessage> {
        let subject = format!(
            "[{}] {}",
            alert.severity.as_str().to_uppercase(),
            title(alert)
        );
        let color = alert.severity.color();
        let regressions = regression_lines(alert);
        let recommendations = recommendation_lines(alert);

        let mut text = format!(
            "{}\n\nEnvironment: {}\nSeverity: {}\nAlert ID: {}\nTime: {}\n\n{}\n",
            title(alert),
            alert.environment,
            alert.severity,
            alert.alert_id,
            alert.timestamp.to_rfc3339(),
            alert.summary
        );
        if !regressions.is_empty() {
            text.push_str("\nRegressions:\n");
            for line in &regressions {
                text.push_str(&format!("- {}\n", line));
            }
        }
        if !recommendations.is_empty() {
            text.push_str("\nRecommendations:\n");
            for line in &recommendations {
                text.push_str(&format!("- {}\n", line));
            }
        }
        if let Some(url) = &alert.report_url {
            text.push_str(&format!("\nReport: {}\n", url));
        }

        let list = |items: &[String]| -> String {
            items
                .iter()
                .map(|i| format!("<li style=\"margin-bottom:4px;\">{}</li>", escape(i)))
                .collect()
        };

        let mut html = format!(
            "<html><body style=\"font-family:Arial,sans-serif;color:#333;\">\
             <div style=\"background-color:{color};color:#fff;padding:16px;border-radius:4px 4px 0 0;\">\
             <h2 style=\"margin:0;\">{}</h2></div>\
             <div style=\"border:1px solid {color};border-top:none;padding:16px;\">\
             <p><strong>Environment:</strong> {}<br>\
             <strong>Severity:</strong> <span style=\"color:{color};font-weight:bold;\">{}</span><br>\
             <strong>Alert ID:</strong> {}<br>\
             <strong>Time:</strong> {}</p>\
             <p>{}</p>",
            escape(&title(alert)),
            escape(&alert.environment),
            alert.severity.as_str().to_uppercase(),
            escape(&alert.alert_id),
            alert.timestamp.to_rfc3339(),
            escape(&alert.summary),
        );
        if !regressions.is_empty() {
            html.push_str(&format!("<h3>Regressions</h3><ul>{}</ul>", list(&regressions)));
        }
        if !recommendations.is_empty() {
            html.push_str(&format!(
                "<h3>Recommendations</h3><ul>{}</ul>",
                list(&recommendations)
            ));
        }
        if let Some(url) = &alert.report_url {
            html.push_str(&format!(
                "<p><a href=\"{}\" style=\"background-color:{color};color:#fff;padding:8px 16px;\
                 text-decoration:none;border-radius:4px;\">View Report</a></p>",
                escape(url)
            ));
        }
        html.push_str("</div></body></html>");

        Ok(ChannelMessage::Email {
            subject,
            html,
            text,
        })
    }
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && self.transport.is_some() && self.verified.load(Ordering::Relaxed)
    }

    async fn send(&self, alert: &Alert) -> AlertResult<()> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| AlertError::DeliveryFailed {
                channel: "email".to_string(),
                details: "transport not configured".to_string(),
            })?;

        let ChannelMessage::Email {
            subject,
            html,
            text,
        } = self.render(alert)?
        else {
            return Err(AlertError::DeliveryFailed {
                channel: "email".to_string(),
                details: "unexpected message shape".to_string(),
            });
        };

        let mut builder = Message::builder()
            .from(self.config.from.parse::<Mailbox>()?)
            .subject(subject);
        for to in &self.config.to {
            builder = builder.to(to.parse::<Mailbox>()?);
        }
        let message = builder.multipart(MultiPart::alternative_plain_html(text, html))?;

        transport.send(message).await?;
        Ok(())
    }
}
