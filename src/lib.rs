//! Guide Notifier Library
//!
//! Periodic and on-demand tourist guide notifications, with deduplicated
//! scheduling, cancellation and retry.

pub mod app;
pub mod cli_style;
pub mod config;
pub mod content;
pub mod controller;
pub mod delivery;
pub mod jobs;
pub mod metrics;
pub mod shell;

// Re-export commonly used types for convenience
pub use app::{App, PermissionControl};
pub use config::{AppConfig, CliConfig, FileConfig};
pub use controller::Controller;
pub use jobs::{ExecutionOutcome, ExistingJobPolicy, JobRegistry, JobSpec, JobState};
