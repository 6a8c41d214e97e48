//! Caller-facing operations. Each returns an acknowledgement right away and
//! updates the observable status line; completion is never awaited.

use crate::delivery::PermissionProvider;
use crate::jobs::{JobRegistry, JobSpec, JobState};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::info;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_RUNNING: &str = "Running...";
pub const STATUS_STOPPED: &str = "Stopped";
pub const STATUS_PERMISSION_GRANTED: &str = "Permission granted";
pub const STATUS_PERMISSION_DENIED: &str = "Permission denied";

pub const ACK_SCHEDULED: &str = "Periodic notifications scheduled";
pub const ACK_STOPPED: &str = "Periodic notifications stopped";
pub const ACK_ALREADY_GRANTED: &str = "Permission already granted";
pub const ACK_NOT_REQUIRED: &str = "No permission required";
pub const ACK_WAITING: &str = "Waiting for permission decision...";
pub const ACK_SHUT_DOWN: &str = "Scheduler is shut down";

pub struct Controller {
    registry: Arc<JobRegistry>,
    permission: Arc<dyn PermissionProvider>,
    spec: JobSpec,
    status: Arc<watch::Sender<String>>,
    runtime: Handle,
}

impl Controller {
    /// Must be called inside a tokio runtime; permission requests run on it.
    pub fn new(
        registry: Arc<JobRegistry>,
        permission: Arc<dyn PermissionProvider>,
        spec: JobSpec,
    ) -> Self {
        let (status, _) = watch::channel(STATUS_READY.to_string());
        Self {
            registry,
            permission,
            spec,
            status: Arc::new(status),
            runtime: Handle::current(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn job_name(&self) -> &str {
        self.spec.name()
    }

    pub fn job_state(&self) -> JobState {
        self.registry.state(self.spec.name())
    }

    pub fn permission_granted(&self) -> bool {
        self.permission.is_granted()
    }

    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status.subscribe()
    }

    pub fn start_periodic(&self) -> String {
        let handle = self.registry.register_periodic(self.spec.clone());
        if self.job_state() != JobState::Scheduled {
            self.set_status(STATUS_STOPPED.to_string());
            return ACK_SHUT_DOWN.to_string();
        }
        self.set_status(format!(
            "Scheduled every {}",
            format_interval(handle.interval)
        ));
        ACK_SCHEDULED.to_string()
    }

    pub fn stop_periodic(&self) -> String {
        self.registry.cancel(self.spec.name());
        self.set_status(STATUS_STOPPED.to_string());
        ACK_STOPPED.to_string()
    }

    pub fn run_once(&self) -> String {
        let handle = self.registry.run_once();
        self.set_status(STATUS_RUNNING.to_string());
        format!("Running in {}...", format_interval(handle.delay))
    }

    /// Ask for notification permission. The status line changes once the
    /// request resolves, which may be long after this returns.
    pub fn request_permission(&self) -> String {
        if !self.permission.requires_runtime_request() {
            let granted = self.permission.is_granted();
            self.set_status(permission_status(granted).to_string());
            return if granted {
                ACK_NOT_REQUIRED.to_string()
            } else {
                STATUS_PERMISSION_DENIED.to_string()
            };
        }
        if self.permission.is_granted() {
            self.set_status(STATUS_PERMISSION_GRANTED.to_string());
            return ACK_ALREADY_GRANTED.to_string();
        }

        let permission = Arc::clone(&self.permission);
        let status = Arc::clone(&self.status);
        self.runtime.spawn(async move {
            let granted = permission.request_permission().await;
            info!(granted, "Permission request resolved");
            status.send_replace(permission_status(granted).to_string());
        });
        ACK_WAITING.to_string()
    }

    fn set_status(&self, status: String) {
        info!("Status: {}", status);
        self.status.send_replace(status);
    }
}

fn permission_status(granted: bool) -> &'static str {
    if granted {
        STATUS_PERMISSION_GRANTED
    } else {
        STATUS_PERMISSION_DENIED
    }
}

/// Short human form: `15 min`, `2 h`, `1 s`, `90 s`. Anything with a
/// millisecond remainder prints whole in ms.
pub fn format_interval(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 || duration.subsec_millis() != 0 {
        return format!("{} ms", duration.as_millis());
    }
    if secs % 3600 == 0 {
        format!("{} h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} s", secs)
    }
}
