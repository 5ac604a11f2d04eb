//! Error types for regression detection and alert delivery

use thiserror::Error;

/// Errors raised while loading or validating engine configuration
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Configuration error
    #[error("Configuration error: {parameter} - {message}")]
    ConfigurationError { parameter: String, message: String },

    /// Data validation failed
    #[error("Data validation failed: {validation_type} - {details}")]
    DataValidationFailed {
        validation_type: String,
        details: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    /// TOML configuration parse error
    #[error("TOML error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },
}

/// Result alias for configuration and validation operations
pub type RegressionResult<T> = Result<T, RegressionError>;

/// Failure of a single notification channel.
///
/// These never escape `AlertManager::send_alert`; they are rendered into
/// `DispatchResult::Dispatched::errors` as `"{channel}: {error}"`.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Alert delivery failed
    #[error("Alert delivery failed: {channel} - {details}")]
    DeliveryFailed { channel: String, details: String },

    /// Channel did not answer within its configured timeout
    #[error("Timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Remote endpoint answered with a non-success status
    #[error("Unexpected HTTP status {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SMTP transport error
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Email message could not be built
    #[error("Email build error: {0}")]
    EmailBuild(#[from] lettre::error::Error),

    /// Email address could not be parsed
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Payload serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for channel delivery
pub type AlertResult<T> = Result<T, AlertError>;
