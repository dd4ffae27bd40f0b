//! Configuration management for verbtunnel

use crate::error::{ProbeError, Result};
use crate::models::ScanConfig;
use serde::Deserialize;
use std::path::Path;

/// Config file picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "verbtunnel.toml";

/// File-based configuration structure
#[derive(Debug, Deserialize)]
struct FileConfig {
    scan: Option<ScanSection>,
    output: Option<OutputSection>,
}

#[derive(Debug, Deserialize)]
struct ScanSection {
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    max_idle_per_host: Option<usize>,
    idle_timeout_secs: Option<u64>,
    max_redirects: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OutputSection {
    format: Option<String>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses TOML configuration text on top of the defaults
pub fn parse_config(content: &str) -> Result<ScanConfig> {
    let file_config: FileConfig = toml::from_str(content)?;
    let mut config = ScanConfig::default();

    if let Some(scan) = file_config.scan {
        if let Some(concurrency) = scan.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = scan.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(ua) = scan.user_agent {
            config.user_agent = ua;
        }
        if let Some(idle) = scan.max_idle_per_host {
            config.max_idle_per_host = idle;
        }
        if let Some(idle_timeout) = scan.idle_timeout_secs {
            config.idle_timeout_secs = idle_timeout;
        }
        if let Some(redirects) = scan.max_redirects {
            config.max_redirects = redirects;
        }
    }

    if let Some(output) = file_config.output {
        if let Some(format) = output.format {
            config.format = format;
        }
    }

    Ok(config)
}

/// Merges CLI arguments into an existing ScanConfig
pub fn merge_cli_args(
    config: &mut ScanConfig,
    target: Option<String>,
    target_list: Option<String>,
    concurrency: Option<usize>,
    timeout: Option<u64>,
    format: Option<String>,
) {
    if target.is_some() {
        config.target = target;
    }
    if target_list.is_some() {
        config.target_list = target_list;
    }
    if let Some(c) = concurrency {
        config.concurrency = c;
    }
    if let Some(t) = timeout {
        config.timeout_secs = t;
    }
    if let Some(f) = format {
        config.format = f;
    }
}

impl ScanConfig {
    /// Rejects configurations that cannot run, before any request is sent
    pub fn validate(&self) -> Result<()> {
        if self.target.is_none() && self.target_list.is_none() {
            return Err(ProbeError::InvalidInput(
                "a target URL or a target list is required".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ProbeError::InvalidInput(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ProbeError::InvalidInput(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if !matches!(self.format.as_str(), "text" | "json") {
            return Err(ProbeError::InvalidInput(format!(
                "unknown output format '{}', use text or json",
                self.format
            )));
        }
        Ok(())
    }
}
