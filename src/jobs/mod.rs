//! Job scheduling: named periodic jobs, one-off runs, retry and cancellation.

mod job;
mod registry;
mod retry_policy;
mod runner;
mod trigger;

pub use job::{
    ExecutionOutcome, ExistingJobPolicy, JobError, JobHandle, JobInfo, JobSpec, JobState,
    OneOffHandle,
};
pub use registry::JobRegistry;
pub use retry_policy::RetryPolicy;
pub use runner::ExecutionRunner;
pub use trigger::{FireReport, JobTask, TokioTriggerHost, TriggerHost, TriggerKind};
