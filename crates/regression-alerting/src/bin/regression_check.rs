//! Regression check CLI
//!
//! Compares a test run against its baseline, prints the analysis as JSON and
//! optionally dispatches an alert.
//!
//! Usage:
//!   regression-check detect --baseline baseline.json --current run.json [--history history.json] [--alert]
//!   regression-check test-alerts --config engine.toml

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regression_alerting::{
    AlertManager, AlertPayload, Baseline, Detection, EngineConfig, RegressionDetector, TestResult,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Performance regression check for CI pipelines
#[derive(Parser)]
#[command(name = "regression-check")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a run against its baseline
    Detect {
        /// Baseline JSON file
        #[arg(long)]
        baseline: PathBuf,

        /// Current run JSON file (`{"statistics": {...}}`)
        #[arg(long)]
        current: PathBuf,

        /// JSON array of recent duration means, oldest first
        #[arg(long)]
        history: Option<PathBuf>,

        /// Environment name
        #[arg(short, long, default_value = "unknown")]
        environment: String,

        /// Test suite name
        #[arg(short, long, default_value = "default")]
        test_suite: String,

        /// Dispatch an alert when the run regressed or improved
        #[arg(long)]
        alert: bool,

        /// Report link attached to the alert
        #[arg(long)]
        report_url: Option<String>,

        /// Exit with status 1 when a regression is detected
        #[arg(long)]
        fail_on_regression: bool,
    },

    /// Send a test alert through every configured channel
    TestAlerts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Detect {
            baseline,
            current,
            history,
            environment,
            test_suite,
            alert,
            report_url,
            fail_on_regression,
        } => {
            let baseline: Baseline = read_json(&baseline)?;
            let current: TestResult = read_json(&current)?;
            let history = history
                .as_deref()
                .map(read_json::<Vec<f64>>)
                .transpose()?;

            let detector = RegressionDetector::new(config.detector.clone())
                .context("Invalid detector configuration")?;
            let detection = match &history {
                Some(history) => detector.detect_with_history(
                    &environment,
                    &test_suite,
                    &current,
                    Some(&baseline),
                    history,
                ),
                None => detector.detect(&environment, &test_suite, &current, Some(&baseline)),
            };

            println!(
                "{}",
                serde_json::to_string_pretty(&detection).context("Failed to serialize analysis")?
            );

            if alert {
                send_detection_alert(config, &detection, report_url).await?;
            }

            if fail_on_regression && detection.has_regression() {
                std::process::exit(1);
            }
        }
        Commands::TestAlerts => {
            let manager = AlertManager::new(config.alerts)
                .await
                .context("Failed to initialize alert manager")?;
            for (channel, enabled) in manager.channel_status() {
                info!("Channel {}: {}", channel, if enabled { "enabled" } else { "disabled" });
            }
            let result = manager.test_alerts().await;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("Failed to serialize result")?
            );
        }
    }

    Ok(())
}

async fn send_detection_alert(
    config: EngineConfig,
    detection: &Detection,
    report_url: Option<String>,
) -> Result<()> {
    let Some(mut payload) = detection
        .analysis()
        .and_then(|analysis| AlertPayload::from_analyses([analysis]))
    else {
        info!("Nothing to alert on");
        return Ok(());
    };
    payload.report_url = report_url;

    let manager = AlertManager::new(config.alerts)
        .await
        .context("Failed to initialize alert manager")?;
    let result = manager.send_alert(payload).await;
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize dispatch result")?
    );

    let stats = manager.get_alert_stats();
    info!(
        "Alert stats: {} total, {} in the last 24h, {} in the last 7d",
        stats.total, stats.last_24_hours, stats.last_7_days
    );
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
