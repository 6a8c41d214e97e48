mod file_config;

pub use file_config::{CatalogEntryConfig, ChannelConfig, FileConfig, RetryConfig};

use crate::content::{Catalog, CatalogEntry};
use crate::jobs::ExistingJobPolicy;
use anyhow::Result;
use clap::ValueEnum;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_JOB_NAME: &str = "tourist-guide-periodic";
pub const DEFAULT_INTERVAL_SECS: u64 = 15 * 60;
pub const DEFAULT_RUN_ONCE_DELAY_SECS: u64 = 1;
pub const DEFAULT_CHANNEL_ID: &str = "tourist_guide_channel";
pub const DEFAULT_NOTIFICATION_ID: u32 = 1001;

/// Startup configuration problems. Any of these prevents the job registry from
/// being built.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("catalog must contain at least one entry")]
    EmptyCatalog,
    #[error("catalog has {titles} titles but {descriptions} descriptions")]
    CatalogLengthMismatch { titles: usize, descriptions: usize },
    #[error("job interval must be greater than zero")]
    ZeroInterval,
    #[error("job name must not be empty")]
    EmptyJobName,
    #[error("backoff multiplier must be at least 1.0, got {0}")]
    InvalidBackoffMultiplier(f64),
    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },
}

/// How the notification permission is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PermissionMode {
    /// Ask the user at runtime; answered from the shell.
    #[default]
    Prompt,
    /// No runtime permission needed, always granted.
    Granted,
    /// Always refused.
    Denied,
}

/// CLI arguments that can be used for config resolution.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub interval_secs: u64,
    pub run_once_delay_secs: u64,
    pub metrics_port: Option<u16>,
    pub permission: PermissionMode,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            run_once_delay_secs: DEFAULT_RUN_ONCE_DELAY_SECS,
            metrics_port: None,
            permission: PermissionMode::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub job_name: String,
    pub interval: Duration,
    pub run_once_delay: Duration,
    pub policy: ExistingJobPolicy,
    pub metrics_port: Option<u16>,
    pub permission: PermissionMode,

    pub channel: ChannelSettings,
    pub retry: RetrySettings,
    pub catalog: Catalog,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let job_name = file
            .job_name
            .unwrap_or_else(|| DEFAULT_JOB_NAME.to_string());
        if job_name.trim().is_empty() {
            return Err(ConfigError::EmptyJobName.into());
        }

        let interval_secs = file.interval_secs.unwrap_or(cli.interval_secs);
        if interval_secs == 0 {
            return Err(ConfigError::ZeroInterval.into());
        }
        let run_once_delay_secs = file.run_once_delay_secs.unwrap_or(cli.run_once_delay_secs);

        let policy = match file.policy {
            Some(value) => parse_value_enum::<ExistingJobPolicy>("policy", &value)?,
            None => ExistingJobPolicy::Replace,
        };
        let permission = match file.permission {
            Some(value) => parse_value_enum::<PermissionMode>("permission", &value)?,
            None => cli.permission,
        };
        let metrics_port = file.metrics_port.or(cli.metrics_port).filter(|p| *p != 0);

        let channel_file = file.channel.unwrap_or_default();
        let defaults = ChannelSettings::default();
        let channel = ChannelSettings {
            id: channel_file.id.unwrap_or(defaults.id),
            name: channel_file.name.unwrap_or(defaults.name),
            description: channel_file.description.unwrap_or(defaults.description),
            notification_id: channel_file
                .notification_id
                .unwrap_or(defaults.notification_id),
        };

        let retry_file = file.retry.unwrap_or_default();
        let defaults = RetrySettings::default();
        let retry = RetrySettings {
            max_retries: retry_file.max_retries.unwrap_or(defaults.max_retries),
            initial_backoff_secs: retry_file
                .initial_backoff_secs
                .unwrap_or(defaults.initial_backoff_secs),
            max_backoff_secs: retry_file
                .max_backoff_secs
                .unwrap_or(defaults.max_backoff_secs),
            backoff_multiplier: retry_file
                .backoff_multiplier
                .unwrap_or(defaults.backoff_multiplier),
            max_backoff_multiple: retry_file
                .max_backoff_multiple
                .unwrap_or(defaults.max_backoff_multiple)
                .max(1),
        };
        if retry.backoff_multiplier.is_nan() || retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidBackoffMultiplier(retry.backoff_multiplier).into());
        }

        let catalog = match file.catalog {
            Some(entries) => Catalog::new(
                entries
                    .into_iter()
                    .map(|e| CatalogEntry::new(e.title, e.description))
                    .collect(),
            )?,
            None => Catalog::arequipa(),
        };

        Ok(Self {
            job_name,
            interval: Duration::from_secs(interval_secs),
            run_once_delay: Duration::from_secs(run_once_delay_secs),
            policy,
            metrics_port,
            permission,
            channel,
            retry,
            catalog,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    pub id: String,
    pub name: String,
    pub description: String,
    pub notification_id: u32,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            id: DEFAULT_CHANNEL_ID.to_string(),
            name: "Tourist Guide".to_string(),
            description: "Notifications about Arequipa landmarks".to_string(),
            notification_id: DEFAULT_NOTIFICATION_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_multiple: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_secs: 30,
            max_backoff_secs: 5 * 60 * 60,
            backoff_multiplier: 2.0,
            max_backoff_multiple: 8,
        }
    }
}

/// Parses a config string using clap's ValueEnum, case insensitive.
fn parse_value_enum<T: ValueEnum>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    T::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
        field,
        value: value.to_string(),
    })
}
