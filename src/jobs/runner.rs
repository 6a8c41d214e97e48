use super::job::ExecutionOutcome;
use super::trigger::{JobTask, TriggerKind};
use crate::content::ContentSelector;
use crate::delivery::{DeliveryError, DeliverySink, PermissionProvider};
use crate::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Runs one execution: select an item, read the permission, deliver.
pub struct ExecutionRunner {
    selector: Arc<ContentSelector>,
    permission: Arc<dyn PermissionProvider>,
    sink: Arc<DeliverySink>,
}

impl ExecutionRunner {
    pub fn new(
        selector: Arc<ContentSelector>,
        permission: Arc<dyn PermissionProvider>,
        sink: Arc<DeliverySink>,
    ) -> Self {
        Self {
            selector,
            permission,
            sink,
        }
    }

    /// Never fails past this boundary. A missing permission still counts as
    /// `Success`; the delivery metric tells it apart.
    pub async fn run(&self) -> ExecutionOutcome {
        let item = self.selector.select();
        info!("GUIDE: {}", item);

        let permission = self.permission.state();
        let outcome = match self.sink.deliver(&item, permission).await {
            Ok(()) => {
                metrics::record_delivery("delivered");
                ExecutionOutcome::Success
            }
            Err(DeliveryError::PermissionDenied) => {
                info!("Notification suppressed, permission not granted");
                metrics::record_delivery("suppressed");
                ExecutionOutcome::Success
            }
            Err(e) => {
                warn!("Delivery of '{}' failed: {}", item.title, e);
                metrics::record_delivery("failed");
                ExecutionOutcome::RetryableFailure
            }
        };
        info!("Work completed: {}", outcome);
        outcome
    }
}

#[async_trait]
impl JobTask for ExecutionRunner {
    async fn fire(&self, _kind: TriggerKind) -> ExecutionOutcome {
        self.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Catalog, FixedClock};
    use crate::delivery::{ChannelSpec, MemorySurface, StaticPermission};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        surface: Arc<MemorySurface>,
        permission: Arc<StaticPermission>,
        sink: Arc<DeliverySink>,
        runner: ExecutionRunner,
    }

    fn fixture(granted: bool) -> Fixture {
        let catalog = Catalog::from_parallel(&["A", "B"], &["descA", "descB"]).unwrap();
        let selector = ContentSelector::new(catalog)
            .with_rng(StdRng::seed_from_u64(1))
            .with_clock(FixedClock("08:30:00".to_string()));
        let surface = Arc::new(MemorySurface::new());
        let sink = Arc::new(DeliverySink::new(
            surface.clone(),
            ChannelSpec {
                id: "guide".to_string(),
                name: "Guide".to_string(),
                description: "Guide".to_string(),
            },
            1001,
        ));
        let permission = Arc::new(StaticPermission::new(granted));
        let runner = ExecutionRunner::new(Arc::new(selector), permission.clone(), sink.clone());
        Fixture {
            surface,
            permission,
            sink,
            runner,
        }
    }

    #[tokio::test]
    async fn test_run_delivers_selected_item() {
        let fx = fixture(true);
        fx.sink.establish_channel().unwrap();

        assert_eq!(fx.runner.run().await, ExecutionOutcome::Success);

        let posted = fx.surface.visible_for(1001).unwrap();
        assert!(["A", "B"].contains(&posted.title.as_str()));
        assert_eq!(posted.body, format!("desc{}", posted.title));
        assert_eq!(posted.subtitle, "08:30:00");
    }

    #[tokio::test]
    async fn test_denied_permission_is_success_without_post() {
        let fx = fixture(false);
        fx.sink.establish_channel().unwrap();

        assert_eq!(fx.runner.run().await, ExecutionOutcome::Success);
        assert_eq!(fx.surface.post_count(), 0);
    }

    #[tokio::test]
    async fn test_permission_read_per_execution() {
        let fx = fixture(false);
        fx.sink.establish_channel().unwrap();

        fx.runner.run().await;
        assert_eq!(fx.surface.post_count(), 0);

        fx.permission.set_granted(true);
        fx.runner.run().await;
        assert_eq!(fx.surface.post_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_channel_is_retryable() {
        let fx = fixture(true);

        assert_eq!(fx.runner.run().await, ExecutionOutcome::RetryableFailure);
        assert_eq!(
            fx.runner.fire(TriggerKind::OneOff).await,
            ExecutionOutcome::RetryableFailure
        );
    }
}
