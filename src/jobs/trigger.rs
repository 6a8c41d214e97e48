//! Trigger collaborator: turns registered intent into timed executions.

use super::job::ExecutionOutcome;
use super::retry_policy::RetryPolicy;
use crate::config::RetrySettings;
use crate::metrics;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const REPORT_CHANNEL_CAPACITY: usize = 256;

/// Unit of work invoked on each trigger.
#[async_trait]
pub trait JobTask: Send + Sync {
    async fn fire(&self, kind: TriggerKind) -> ExecutionOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Periodic,
    OneOff,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Periodic => "periodic",
            TriggerKind::OneOff => "one_off",
        }
    }
}

/// Emitted after every execution the host runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    /// Periodic job name, or the one-off id.
    pub job: String,
    pub kind: TriggerKind,
    pub outcome: ExecutionOutcome,
    /// 1 for the first attempt, +1 for every retry that follows a failure.
    pub attempt: u32,
}

/// Schedules task invocations. Holds no dedup policy of its own beyond
/// "one schedule per name".
pub trait TriggerHost: Send + Sync {
    /// Fire `task` every `interval`, first fire one full interval from now.
    /// Any schedule already under `name` is cancelled first.
    ///
    /// Returns false, arming nothing, once the host has shut down.
    fn schedule_every(&self, name: &str, interval: Duration, task: Arc<dyn JobTask>) -> bool;

    /// Fire `task` once after `delay`.
    fn schedule_once_after(&self, id: Uuid, delay: Duration, task: Arc<dyn JobTask>);

    /// Stop the schedule under `name`. Returns whether one existed.
    /// No trigger of that schedule starts after this returns.
    fn cancel(&self, name: &str) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<FireReport>;
}

/// Open/closed flag deciding whether a due trigger may start.
///
/// A trigger counts as started once `try_enter` returns true. `close` takes
/// the same lock, so once it returns no further trigger can start.
struct DispatchGate {
    open: Mutex<bool>,
    token: CancellationToken,
}

impl DispatchGate {
    fn new(token: CancellationToken) -> Self {
        Self {
            open: Mutex::new(true),
            token,
        }
    }

    fn try_enter(&self) -> bool {
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        *open && !self.token.is_cancelled()
    }

    fn close(&self) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        *open = false;
        self.token.cancel();
    }
}

struct Schedule {
    id: Uuid,
    gate: Arc<DispatchGate>,
}

/// [`TriggerHost`] driving tokio tasks on a captured runtime handle.
pub struct TokioTriggerHost {
    runtime: Handle,
    retry: RetrySettings,
    schedules: Mutex<HashMap<String, Schedule>>,
    /// Per-name execution locks. They outlive replacement so executions of
    /// one name never overlap across schedules.
    run_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    reports: broadcast::Sender<FireReport>,
    shutdown_token: CancellationToken,
}

impl TokioTriggerHost {
    /// Host bound to the current tokio runtime. Panics outside a runtime.
    pub fn new(retry: RetrySettings) -> Self {
        Self::with_handle(Handle::current(), retry)
    }

    pub fn with_handle(runtime: Handle, retry: RetrySettings) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            runtime,
            retry,
            schedules: Mutex::new(HashMap::new()),
            run_locks: Mutex::new(HashMap::new()),
            reports,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Stop every schedule and pending one-off. In-flight executions finish.
    /// Nothing can be scheduled afterwards.
    pub fn shutdown(&self) {
        let drained: Vec<(String, Schedule)> = {
            let mut schedules = self.schedules();
            self.shutdown_token.cancel();
            schedules.drain().collect()
        };
        for (name, schedule) in drained {
            schedule.gate.close();
            debug!(job = %name, "Schedule closed on shutdown");
        }
        info!("Trigger host shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Names with a live schedule.
    pub fn scheduled_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schedules().keys().cloned().collect();
        names.sort();
        names
    }

    fn schedules(&self) -> MutexGuard<'_, HashMap<String, Schedule>> {
        self.schedules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.run_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }
}

impl TriggerHost for TokioTriggerHost {
    fn schedule_every(&self, name: &str, interval: Duration, task: Arc<dyn JobTask>) -> bool {
        let gate = Arc::new(DispatchGate::new(self.shutdown_token.child_token()));
        let id = Uuid::new_v4();

        let previous = {
            let mut schedules = self.schedules();
            // Checked under the table lock; shutdown cancels under it too.
            if self.shutdown_token.is_cancelled() {
                warn!(job = %name, "Trigger host is shut down, periodic schedule refused");
                return false;
            }
            schedules.insert(
                name.to_string(),
                Schedule {
                    id,
                    gate: Arc::clone(&gate),
                },
            )
        };
        if let Some(previous) = previous {
            previous.gate.close();
            debug!(job = %name, old = %previous.id, "Closed previous schedule");
        }

        let periodic = PeriodicLoop {
            name: name.to_string(),
            interval,
            task,
            gate,
            run_lock: self.run_lock(name),
            policy: RetryPolicy::periodic(interval, &self.retry),
            reports: self.reports.clone(),
        };
        self.runtime.spawn(periodic.run());
        debug!(job = %name, schedule = %id, ?interval, "Periodic schedule armed");
        true
    }

    fn schedule_once_after(&self, id: Uuid, delay: Duration, task: Arc<dyn JobTask>) {
        if self.is_shut_down() {
            warn!(job = %id, "Trigger host is shut down, one-off run dropped");
            return;
        }
        let token = self.shutdown_token.child_token();
        let policy = RetryPolicy::one_off(&self.retry);
        let reports = self.reports.clone();

        self.runtime.spawn(async move {
            let job = id.to_string();
            let mut delay = delay;
            let mut retry_count = 0;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(job = %job, "One-off run dropped before start");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                let outcome = execute(Arc::clone(&task), TriggerKind::OneOff, None).await;
                let _ = reports.send(FireReport {
                    job: job.clone(),
                    kind: TriggerKind::OneOff,
                    outcome,
                    attempt: retry_count + 1,
                });

                if !policy.should_retry(outcome, retry_count) {
                    if outcome == ExecutionOutcome::RetryableFailure {
                        error!(job = %job, attempts = retry_count + 1, "One-off run gave up");
                    }
                    return;
                }
                delay = policy.backoff(retry_count);
                retry_count += 1;
                warn!(job = %job, retry = retry_count, ?delay, "One-off run failed, retrying");
            }
        });
    }

    fn cancel(&self, name: &str) -> bool {
        match self.schedules().remove(name) {
            Some(schedule) => {
                schedule.gate.close();
                debug!(job = %name, schedule = %schedule.id, "Schedule cancelled");
                true
            }
            None => false,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<FireReport> {
        self.reports.subscribe()
    }
}

struct PeriodicLoop {
    name: String,
    interval: Duration,
    task: Arc<dyn JobTask>,
    gate: Arc<DispatchGate>,
    run_lock: Arc<tokio::sync::Mutex<()>>,
    policy: RetryPolicy,
    reports: broadcast::Sender<FireReport>,
}

impl PeriodicLoop {
    async fn run(self) {
        let mut failures: u32 = 0;
        loop {
            let delay = match failures {
                0 => self.interval,
                n => self.policy.backoff(n - 1),
            };
            tokio::select! {
                _ = self.gate.token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            // Wait out any execution of the same name, including one from a
            // replaced schedule, before checking the gate.
            let guard = tokio::select! {
                _ = self.gate.token.cancelled() => break,
                guard = Arc::clone(&self.run_lock).lock_owned() => guard,
            };
            if !self.gate.try_enter() {
                break;
            }

            debug!(job = %self.name, attempt = failures + 1, "Dispatching periodic trigger");
            let outcome = execute(Arc::clone(&self.task), TriggerKind::Periodic, Some(guard)).await;
            let _ = self.reports.send(FireReport {
                job: self.name.clone(),
                kind: TriggerKind::Periodic,
                outcome,
                attempt: failures + 1,
            });

            if self.policy.should_retry(outcome, failures) {
                failures = failures.saturating_add(1);
                warn!(
                    job = %self.name,
                    failures,
                    next_in = ?self.policy.backoff(failures - 1),
                    "Periodic execution failed, backing off"
                );
            } else {
                failures = 0;
            }
        }
        debug!(job = %self.name, "Periodic schedule stopped");
    }
}

/// Run one invocation on its own task so a panic is contained.
/// `run_guard` is held until the invocation finishes.
async fn execute(
    task: Arc<dyn JobTask>,
    kind: TriggerKind,
    run_guard: Option<OwnedMutexGuard<()>>,
) -> ExecutionOutcome {
    let start_time = Instant::now();
    let result = tokio::spawn(async move {
        let _run_guard = run_guard;
        task.fire(kind).await
    })
    .await;
    let elapsed = start_time.elapsed();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{} execution panicked after {:?}: {}", kind.as_str(), elapsed, e);
            ExecutionOutcome::PermanentFailure
        }
    };
    metrics::record_execution(kind.as_str(), outcome.as_str(), elapsed);
    outcome
}
