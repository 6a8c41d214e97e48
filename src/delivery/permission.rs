//! Notification permission collaborators.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Snapshot of the permission answer, read once per delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionState {
    pub granted: bool,
}

impl PermissionState {
    pub fn granted() -> Self {
        Self { granted: true }
    }

    pub fn denied() -> Self {
        Self { granted: false }
    }
}

/// Grants or refuses the right to post notifications.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    fn is_granted(&self) -> bool;

    fn state(&self) -> PermissionState {
        PermissionState {
            granted: self.is_granted(),
        }
    }

    /// Whether `request_permission` asks the user or answers on its own.
    fn requires_runtime_request(&self) -> bool {
        true
    }

    /// Ask for permission. May wait for a user decision; resolves to a final yes/no.
    async fn request_permission(&self) -> bool;
}

/// Permission with a fixed answer that can be flipped from code.
///
/// Models platforms where notifications need no runtime permission, and
/// doubles as the test double for the permission subsystem.
pub struct StaticPermission {
    granted: AtomicBool,
}

impl StaticPermission {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn granted() -> Self {
        Self::new(true)
    }

    pub fn denied() -> Self {
        Self::new(false)
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

#[async_trait]
impl PermissionProvider for StaticPermission {
    fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn requires_runtime_request(&self) -> bool {
        false
    }

    async fn request_permission(&self) -> bool {
        self.is_granted()
    }
}

/// Permission decided by the user. Requests park until [`answer`] is called.
///
/// [`answer`]: InteractivePermission::answer
pub struct InteractivePermission {
    granted: AtomicBool,
    pending: Mutex<Vec<oneshot::Sender<bool>>>,
}

impl InteractivePermission {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Record the user's decision and resolve every waiting request.
    /// Returns how many requests were waiting.
    pub fn answer(&self, granted: bool) -> usize {
        // Flag and waiter list change under one lock so a request cannot
        // park between the two.
        let waiters: Vec<_> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            self.granted.store(granted, Ordering::SeqCst);
            pending.drain(..).collect()
        };
        let count = waiters.len();
        for waiter in waiters {
            let _ = waiter.send(granted);
        }
        info!(granted, resolved = count, "Permission decision recorded");
        count
    }

    pub fn has_pending(&self) -> bool {
        !self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

#[async_trait]
impl PermissionProvider for InteractivePermission {
    fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn request_permission(&self) -> bool {
        let rx = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if self.is_granted() {
                return true;
            }
            let (tx, rx) = oneshot::channel();
            pending.push(tx);
            rx
        };
        debug!("Permission request waiting for a user decision");
        // A dropped sender means nobody will answer; treat it as a refusal.
        rx.await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_static_permission() {
        let permission = StaticPermission::denied();
        assert!(!permission.is_granted());
        assert_eq!(permission.state(), PermissionState::denied());
        assert!(!permission.request_permission().await);
        assert!(!permission.requires_runtime_request());

        permission.set_granted(true);
        assert!(permission.is_granted());
        assert_eq!(permission.state(), PermissionState::granted());
        assert!(permission.request_permission().await);
    }

    #[tokio::test]
    async fn test_interactive_already_granted_returns_immediately() {
        let permission = InteractivePermission::new(true);
        assert!(permission.request_permission().await);
        assert!(!permission.has_pending());
    }

    #[tokio::test]
    async fn test_interactive_waits_for_answer() {
        let permission = Arc::new(InteractivePermission::new(false));
        assert!(permission.requires_runtime_request());

        let requester = Arc::clone(&permission);
        let request = tokio::spawn(async move { requester.request_permission().await });

        // Let the request park.
        while !permission.has_pending() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(permission.answer(true), 1);

        assert!(request.await.unwrap());
        assert!(permission.is_granted());
        assert!(!permission.has_pending());
    }

    #[tokio::test]
    async fn test_interactive_denial_resolves_all_waiters() {
        let permission = Arc::new(InteractivePermission::new(false));

        let mut requests = Vec::new();
        for _ in 0..3 {
            let requester = Arc::clone(&permission);
            requests.push(tokio::spawn(
                async move { requester.request_permission().await },
            ));
        }
        loop {
            let waiting = permission
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len();
            if waiting == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert_eq!(permission.answer(false), 3);
        for request in requests {
            assert!(!request.await.unwrap());
        }
        assert!(!permission.is_granted());
    }

    #[test]
    fn test_answer_racing_a_request_never_strands_it() {
        let permission = Arc::new(InteractivePermission::new(false));
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        // Hold the waiter list so the request and the answer queue up on it.
        let held = permission
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let requester = Arc::clone(&permission);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let granted = runtime.block_on(requester.request_permission());
            let _ = done_tx.send(granted);
        });
        std::thread::sleep(Duration::from_millis(20));

        let answerer = Arc::clone(&permission);
        let answer = std::thread::spawn(move || answerer.answer(true));
        std::thread::sleep(Duration::from_millis(20));

        drop(held);
        answer.join().unwrap();
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)), Ok(true));
        assert!(!permission.has_pending());
    }

    #[tokio::test]
    async fn test_request_after_answer_resolves_immediately() {
        let permission = InteractivePermission::new(false);
        permission.answer(true);
        assert!(permission.request_permission().await);
        assert!(!permission.has_pending());
    }

    #[test]
    fn test_answer_without_waiters() {
        let permission = InteractivePermission::new(false);
        assert_eq!(permission.answer(true), 0);
        assert!(permission.is_granted());
    }
}
