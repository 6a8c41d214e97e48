use clap::ValueEnum;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// What `register_periodic` does when a live schedule already exists under the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExistingJobPolicy {
    /// Tear down the live schedule and install the new one.
    #[default]
    Replace,
    /// Leave the live schedule untouched.
    #[value(alias = "keep_existing")]
    KeepExisting,
}

impl std::fmt::Display for ExistingJobPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExistingJobPolicy::Replace => write!(f, "replace"),
            ExistingJobPolicy::KeepExisting => write!(f, "keep-existing"),
        }
    }
}

/// Errors raised while building job descriptions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("Invalid job spec: {0}")]
    InvalidSpec(String),
}

/// A validated periodic job description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    name: String,
    interval: Duration,
    policy: ExistingJobPolicy,
}

impl JobSpec {
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        policy: ExistingJobPolicy,
    ) -> Result<Self, JobError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(JobError::InvalidSpec("name must not be empty".to_string()));
        }
        if interval.is_zero() {
            return Err(JobError::InvalidSpec(format!(
                "interval of '{}' must be greater than zero",
                name
            )));
        }
        Ok(Self {
            name,
            interval,
            policy,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn policy(&self) -> ExistingJobPolicy {
        self.policy
    }
}

/// Lifecycle of a named periodic job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Absent,
    Scheduled,
    Cancelled,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Absent => write!(f, "absent"),
            JobState::Scheduled => write!(f, "scheduled"),
            JobState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one execution, used for retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    RetryableFailure,
    PermanentFailure,
}

impl ExecutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success => "success",
            ExecutionOutcome::RetryableFailure => "retryable_failure",
            ExecutionOutcome::PermanentFailure => "permanent_failure",
        }
    }
}

impl std::fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot describing a live periodic schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub name: String,
    pub id: Uuid,
    pub interval: Duration,
}

/// Snapshot describing one scheduled one-off run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOffHandle {
    pub id: Uuid,
    pub delay: Duration,
}

/// Row of the registry listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub name: String,
    pub state: JobState,
    pub policy: ExistingJobPolicy,
    pub handle: Option<JobHandle>,
}
