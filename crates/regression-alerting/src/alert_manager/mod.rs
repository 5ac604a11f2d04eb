//! Performance alert generation and delivery for regression detection
//!
//! `send_alert` applies the hourly cap and duplicate suppression, enriches the
//! payload, records it in the bounded history and fans it out to every
//! channel concurrently. Failures never escape as errors; they are reported
//! in the returned [`DispatchResult`].

pub mod channels;
pub mod config;
pub mod history;
pub mod rate_limit;
pub mod types;


pub use channels::{
    AlertRenderer, ChannelMessage, ChannelOutcome, ConsoleChannel, EmailChannel,
    NotificationChannel, SlackChannel, TeamsChannel, WebhookChannel, DECLINED_REASON,
};
pub use config::{
    AlertManagerConfig, ChannelsConfig, ConsoleConfig, EmailConfig, SlackConfig, TeamsConfig,
    WebhookConfig,
};
pub use history::AlertHistory;
pub use rate_limit::{RateLimitState, Suppression};
pub use types::*;

use crate::error::{AlertError, RegressionError, RegressionResult};
use crate::statistics::Severity;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Process-lifetime state guarded by one lock so gate checks and records are
/// atomic across concurrent callers
#[derive(Debug, Default)]
struct DispatchState {
    rate_limits: RateLimitState,
    history: AlertHistory,
}

/// Alert manager for handling performance alerts
pub struct AlertManager {
    config: AlertManagerConfig,
    channels: Vec<Arc<dyn NotificationChannel>>,
    state: Mutex<DispatchState>,
}

impl AlertManager {
    /// Create a manager with the built-in channels.
    ///
    /// The email transport is verified here, once; on failure the email
    /// channel stays disabled for the manager's lifetime.
    pub async fn new(config: AlertManagerConfig) -> RegressionResult<Self> {
        config.validate()?;
        let channels = build_channels(&config).await?;
        Ok(Self::assemble(config, channels))
    }

    /// Create a manager dispatching to `channels` only
    pub fn with_channels(
        config: AlertManagerConfig,
        channels: Vec<Arc<dyn NotificationChannel>>,
    ) -> RegressionResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, channels))
    }

    fn assemble(config: AlertManagerConfig, channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        let state = DispatchState {
            rate_limits: RateLimitState::new(),
            history: AlertHistory::with_capacity(config.history_capacity),
        };
        Self {
            config,
            channels,
            state: Mutex::new(state),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &AlertManagerConfig {
        &self.config
    }

    /// Rate-limit, enrich, record and fan out one alert
    pub async fn send_alert(&self, payload: AlertPayload) -> DispatchResult {
        let now = Utc::now();
        let environment = payload
            .environment
            .clone()
            .unwrap_or_else(|| self.config.default_environment.clone());
        let key = RateLimitState::duplicate_key(&payload.alert_type, &environment);

        let alert = {
            let mut state = self.state.lock();
            state.rate_limits.prune(now);

            let window = Duration::minutes(
                self.config
                    .duplicate_suppression_minutes
                    .min(rate_limit::WINDOW_MINUTES) as i64,
            );
            if let Some(suppression) =
                state
                    .rate_limits
                    .check(&key, now, self.config.max_alerts_per_hour, window)
            {
                match suppression {
                    Suppression::HourlyCap => warn!(
                        "Hourly alert cap of {} reached, suppressing {}",
                        self.config.max_alerts_per_hour, key
                    ),
                    Suppression::Duplicate => {
                        info!("Skipping duplicate alert {} within suppression window", key)
                    }
                }
                return DispatchResult::rate_limited();
            }
            state.rate_limits.record(&key, now);

            let alert = enrich(payload, environment, now);
            state
                .history
                .push(AlertHistoryEntry::recorded(&alert, now));
            alert
        };

        let outcomes = self.dispatch(&alert).await;

        let mut channels = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                ChannelOutcome::Delivered { channel } => channels.push(channel),
                ChannelOutcome::Failed { channel, error } => {
                    errors.push(format!("{}: {}", channel, error))
                }
                ChannelOutcome::Declined { .. } => {}
            }
        }

        let success = !channels.is_empty();
        if success {
            info!(
                "Alert {} dispatched via [{}]",
                alert.alert_id,
                channels.join(", ")
            );
        } else {
            error!(
                "Alert {} was not delivered by any channel ({} errors)",
                alert.alert_id,
                errors.len()
            );
        }

        DispatchResult::Dispatched {
            success,
            channels,
            errors,
            alert_id: alert.alert_id,
        }
    }

    /// Offer the alert to every channel concurrently and wait for all of them
    pub async fn dispatch(&self, alert: &Alert) -> Vec<ChannelOutcome> {
        join_all(
            self.channels
                .iter()
                .map(|channel| send_to_channel(channel.as_ref(), alert)),
        )
        .await
    }

    /// Send a synthetic low-severity alert through the full `send_alert` path
    pub async fn test_alerts(&self) -> DispatchResult {
        let payload = AlertPayload {
            alert_type: "test".to_string(),
            severity: AlertSeverity::Info,
            environment: Some(self.config.default_environment.clone()),
            regressions: vec![RegressionEntry {
                test_suite: "alert-self-test".to_string(),
                environment: self.config.default_environment.clone(),
                metric: "duration".to_string(),
                percentage_change: 0.0,
                severity: Severity::Normal,
            }],
            recommendations: Vec::new(),
            summary: Some(
                "Test alert: verifying notification channel configuration".to_string(),
            ),
            timestamp: None,
            report_url: None,
        };
        self.send_alert(payload).await
    }

    /// Totals and tallies over the alert history
    pub fn get_alert_stats(&self) -> AlertStats {
        self.state.lock().history.stats(Utc::now())
    }

    /// Snapshot of the alert history, oldest first
    pub fn history(&self) -> Vec<AlertHistoryEntry> {
        self.state.lock().history.iter().cloned().collect()
    }

    /// `(channel, enabled)` for every channel, reflecting email auto-disable
    pub fn channel_status(&self) -> Vec<(String, bool)> {
        self.channels
            .iter()
            .map(|c| (c.name().to_string(), c.is_enabled()))
            .collect()
    }
}

async fn build_channels(
    config: &AlertManagerConfig,
) -> RegressionResult<Vec<Arc<dyn NotificationChannel>>> {
    let channels = &config.channels;
    let http_error = |e: AlertError| RegressionError::ConfigurationError {
        parameter: "channels".to_string(),
        message: e.to_string(),
    };

    Ok(vec![
        Arc::new(ConsoleChannel::new(channels.console.clone())),
        Arc::new(EmailChannel::connect(channels.email.clone()).await),
        Arc::new(SlackChannel::new(channels.slack.clone()).map_err(http_error)?),
        Arc::new(TeamsChannel::new(channels.teams.clone()).map_err(http_error)?),
        Arc::new(WebhookChannel::new(channels.webhook.clone()).map_err(http_error)?),
    ])
}

async fn send_to_channel(channel: &dyn NotificationChannel, alert: &Alert) -> ChannelOutcome {
    let name = channel.name().to_string();
    if !channel.is_enabled() {
        return ChannelOutcome::Declined {
            channel: name,
            reason: DECLINED_REASON.to_string(),
        };
    }

    match channel.send(alert).await {
        Ok(()) => {
            info!("Alert {} sent successfully via {}", alert.alert_id, name);
            ChannelOutcome::Delivered { channel: name }
        }
        Err(e) => {
            error!("Failed to send alert {} via {}: {}", alert.alert_id, name, e);
            ChannelOutcome::Failed {
                channel: name,
                error: e.to_string(),
            }
        }
    }
}

/// First 12 hex chars of SHA-256 over type, environment and time
pub fn generate_alert_id(alert_type: &str, environment: &str, at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(alert_type.as_bytes());
    hasher.update(environment.as_bytes());
    hasher.update(at.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

/// `"N performance regression(s) detected (C critical, W warning)"`
pub fn synthesize_summary(regressions: &[RegressionEntry]) -> String {
    let critical = regressions
        .iter()
        .filter(|r| r.severity == Severity::Critical)
        .count();
    let warning = regressions
        .iter()
        .filter(|r| r.severity == Severity::Warning)
        .count();
    format!(
        "{} performance regression(s) detected ({} critical, {} warning)",
        regressions.len(),
        critical,
        warning
    )
}

fn enrich(payload: AlertPayload, environment: String, now: DateTime<Utc>) -> Alert {
    let summary = payload
        .summary
        .unwrap_or_else(|| synthesize_summary(&payload.regressions));

    Alert {
        alert_id: generate_alert_id(&payload.alert_type, &environment, now),
        alert_type: payload.alert_type,
        severity: payload.severity,
        environment,
        regressions: payload.regressions,
        recommendations: payload.recommendations,
        summary,
        timestamp: payload.timestamp.unwrap_or(now),
        report_url: payload.report_url,
    }
}
