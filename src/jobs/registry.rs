use super::job::{ExistingJobPolicy, JobHandle, JobInfo, JobSpec, JobState, OneOffHandle};
use super::trigger::{JobTask, TriggerHost};
use crate::metrics;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct JobEntry {
    handle: JobHandle,
    policy: ExistingJobPolicy,
    state: JobState,
}

/// Tracks named periodic jobs and applies the registration policy.
///
/// The table lock is held across the host calls of each mutation, so
/// concurrent register/cancel calls are serialized and never leave two live
/// schedules under one name.
pub struct JobRegistry {
    host: Arc<dyn TriggerHost>,
    task: Arc<dyn JobTask>,
    one_off_delay: Duration,
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new(
        host: Arc<dyn TriggerHost>,
        task: Arc<dyn JobTask>,
        one_off_delay: Duration,
    ) -> Self {
        Self {
            host,
            task,
            one_off_delay,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn one_off_delay(&self) -> Duration {
        self.one_off_delay
    }

    /// Register a periodic job, reconciling with a live one under the same name
    /// according to `spec.policy()`.
    pub fn register_periodic(&self, spec: JobSpec) -> JobHandle {
        let mut jobs = self.table();
        let name = spec.name().to_string();

        let live = jobs
            .get(&name)
            .filter(|entry| entry.state == JobState::Scheduled);
        let replacing = match (live, spec.policy()) {
            (Some(entry), ExistingJobPolicy::KeepExisting) => {
                info!(
                    job = %name,
                    interval = ?entry.handle.interval,
                    "Periodic job already scheduled, keeping existing"
                );
                metrics::record_registration("kept");
                return entry.handle.clone();
            }
            (Some(entry), ExistingJobPolicy::Replace) => {
                self.host.cancel(&name);
                debug!(job = %name, old = %entry.handle.id, "Tearing down previous schedule");
                true
            }
            (None, _) => false,
        };

        let handle = JobHandle {
            name: name.clone(),
            id: Uuid::new_v4(),
            interval: spec.interval(),
        };
        let armed = self
            .host
            .schedule_every(&name, spec.interval(), Arc::clone(&self.task));
        jobs.insert(
            name.clone(),
            JobEntry {
                handle: handle.clone(),
                policy: spec.policy(),
                state: if armed {
                    JobState::Scheduled
                } else {
                    JobState::Cancelled
                },
            },
        );

        if !armed {
            warn!(job = %name, "Trigger host refused the schedule, job recorded as cancelled");
            metrics::record_registration("refused");
            metrics::set_periodic_job_active(&name, false);
            return handle;
        }
        if replacing {
            info!(job = %name, interval = ?spec.interval(), "Periodic job replaced");
            metrics::record_registration("replaced");
        } else {
            info!(job = %name, interval = ?spec.interval(), "Periodic job scheduled");
            metrics::record_registration("scheduled");
        }
        metrics::set_periodic_job_active(&name, true);
        handle
    }

    /// Schedule one execution after the one-off delay, independent of any
    /// periodic schedule. Every call schedules its own execution.
    pub fn run_once(&self) -> OneOffHandle {
        let handle = OneOffHandle {
            id: Uuid::new_v4(),
            delay: self.one_off_delay,
        };
        self.host
            .schedule_once_after(handle.id, handle.delay, Arc::clone(&self.task));
        info!(id = %handle.id, delay = ?handle.delay, "One-off run scheduled");
        handle
    }

    /// Cancel the periodic job under `name`. Returns whether a live schedule
    /// was stopped. An execution already running is left to finish.
    pub fn cancel(&self, name: &str) -> bool {
        let mut jobs = self.table();
        match jobs.get_mut(name) {
            Some(entry) if entry.state == JobState::Scheduled => {
                self.host.cancel(name);
                entry.state = JobState::Cancelled;
                info!(job = %name, "Periodic job cancelled");
                metrics::set_periodic_job_active(name, false);
                true
            }
            _ => {
                debug!(job = %name, "Cancel ignored, job not scheduled");
                false
            }
        }
    }

    pub fn state(&self, name: &str) -> JobState {
        self.table()
            .get(name)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Handle of the live schedule under `name`, if any.
    pub fn handle(&self, name: &str) -> Option<JobHandle> {
        self.table()
            .get(name)
            .filter(|entry| entry.state == JobState::Scheduled)
            .map(|entry| entry.handle.clone())
    }

    /// Every name the registry has seen, sorted by name.
    pub fn jobs(&self) -> Vec<JobInfo> {
        let mut infos: Vec<JobInfo> = self
            .table()
            .iter()
            .map(|(name, entry)| JobInfo {
                name: name.clone(),
                state: entry.state,
                policy: entry.policy,
                handle: (entry.state == JobState::Scheduled).then(|| entry.handle.clone()),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
