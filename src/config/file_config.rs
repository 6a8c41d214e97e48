use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub job_name: Option<String>,
    pub interval_secs: Option<u64>,
    pub run_once_delay_secs: Option<u64>,
    pub policy: Option<String>,
    pub metrics_port: Option<u16>,
    pub permission: Option<String>,

    // Feature configs
    pub channel: Option<ChannelConfig>,
    pub retry: Option<RetryConfig>,
    pub catalog: Option<Vec<CatalogEntryConfig>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ChannelConfig {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub notification_id: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub initial_backoff_secs: Option<u64>,
    pub max_backoff_secs: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    /// Cap for periodic backoff, as a multiple of the job interval.
    pub max_backoff_multiple: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CatalogEntryConfig {
    pub title: String,
    pub description: String,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
