//! Job tasks with controllable behavior for scheduling tests

#![allow(dead_code)]

use async_trait::async_trait;
use guide_notifier::jobs::{ExecutionOutcome, JobTask, TriggerKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Counts invocations and returns a fixed outcome.
pub struct CountingTask {
    fired: AtomicUsize,
    outcome: ExecutionOutcome,
}

impl CountingTask {
    pub fn new() -> Self {
        Self::returning(ExecutionOutcome::Success)
    }

    pub fn returning(outcome: ExecutionOutcome) -> Self {
        Self {
            fired: AtomicUsize::new(0),
            outcome,
        }
    }

    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobTask for CountingTask {
    async fn fire(&self, _kind: TriggerKind) -> ExecutionOutcome {
        self.fired.fetch_add(1, Ordering::SeqCst);
        self.outcome
    }
}

/// Blocks every invocation until a permit is released.
pub struct GatedTask {
    started: AtomicUsize,
    finished: AtomicUsize,
    permits: Semaphore,
}

impl GatedTask {
    pub fn new() -> Self {
        Self {
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            permits: Semaphore::new(0),
        }
    }

    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobTask for GatedTask {
    async fn fire(&self, _kind: TriggerKind) -> ExecutionOutcome {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        ExecutionOutcome::Success
    }
}

/// Takes a fixed time per invocation and records the highest overlap seen.
pub struct SlowTask {
    duration: Duration,
    running: AtomicUsize,
    max_running: AtomicUsize,
    fired: AtomicUsize,
}

impl SlowTask {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            fired: AtomicUsize::new(0),
        }
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobTask for SlowTask {
    async fn fire(&self, _kind: TriggerKind) -> ExecutionOutcome {
        self.fired.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.duration).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        ExecutionOutcome::Success
    }
}

/// Fails with a retryable error for the first `failures` invocations.
pub struct FlakyTask {
    failures: usize,
    fired: AtomicUsize,
}

impl FlakyTask {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            fired: AtomicUsize::new(0),
        }
    }

    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobTask for FlakyTask {
    async fn fire(&self, _kind: TriggerKind) -> ExecutionOutcome {
        let n = self.fired.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            ExecutionOutcome::RetryableFailure
        } else {
            ExecutionOutcome::Success
        }
    }
}
