//! Error types for verbtunnel

use thiserror::Error;

/// Main error type for probe operations
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connection, DNS, TLS or timeout failure on a single request
    #[error("Network error: {0}")]
    Network(String),

    #[error("All override header attempts failed for target method {target_method}")]
    AllAttemptsFailed { target_method: String },

    #[error("OPTIONS returned 200 but advertised no allowed methods")]
    InconclusiveDiscovery,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        ProbeError::Network(err.to_string())
    }
}

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;
