//! Engine configuration loaded from TOML
//!
//! ```toml
//! [detector.thresholds.performance]
//! warning = 10.0
//! critical = 25.0
//!
//! [alerts]
//! max_alerts_per_hour = 5
//! default_environment = "ci"
//!
//! [alerts.channels.slack]
//! enabled = true
//! webhook_url = "https://hooks.slack.com/services/..."
//! ```

use crate::alert_manager::AlertManagerConfig;
use crate::detector::DetectorConfig;
use crate::error::RegressionResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Detector and alert manager settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Regression detector settings
    pub detector: DetectorConfig,
    /// Alert manager settings
    pub alerts: AlertManagerConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from(path: impl AsRef<Path>) -> RegressionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> RegressionResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check thresholds, algorithm parameters and rate limits
    pub fn validate(&self) -> RegressionResult<()> {
        self.detector.validate()?;
        self.alerts.validate()
    }
}
