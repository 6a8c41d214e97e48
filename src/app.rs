//! Wires configuration into a running set of components.

use crate::config::{AppConfig, PermissionMode};
use crate::content::ContentSelector;
use crate::controller::Controller;
use crate::delivery::{
    ChannelSpec, DeliverySink, InteractivePermission, NotificationSurface, PermissionProvider,
    StaticPermission,
};
use crate::jobs::{ExecutionRunner, JobRegistry, JobSpec, TokioTriggerHost};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// The permission collaborator together with the knob that changes its answer.
#[derive(Clone)]
pub enum PermissionControl {
    Interactive(Arc<InteractivePermission>),
    Static(Arc<StaticPermission>),
}

impl PermissionControl {
    pub fn from_mode(mode: PermissionMode) -> Self {
        match mode {
            PermissionMode::Prompt => Self::Interactive(Arc::new(InteractivePermission::new(false))),
            PermissionMode::Granted => Self::Static(Arc::new(StaticPermission::granted())),
            PermissionMode::Denied => Self::Static(Arc::new(StaticPermission::denied())),
        }
    }

    pub fn provider(&self) -> Arc<dyn PermissionProvider> {
        match self {
            Self::Interactive(p) => p.clone(),
            Self::Static(p) => p.clone(),
        }
    }

    /// Apply a user decision. Resolves pending requests when interactive.
    pub fn decide(&self, granted: bool) {
        match self {
            Self::Interactive(p) => {
                p.answer(granted);
            }
            Self::Static(p) => p.set_granted(granted),
        }
    }
}

/// All long-lived components of one process.
pub struct App {
    pub config: AppConfig,
    pub host: Arc<TokioTriggerHost>,
    pub registry: Arc<JobRegistry>,
    pub controller: Arc<Controller>,
    pub sink: Arc<DeliverySink>,
    pub surface: Arc<dyn NotificationSurface>,
    pub permission: PermissionControl,
}

impl App {
    /// Build with an OS-seeded selector over the configured catalog.
    /// Must be called inside a tokio runtime.
    pub fn build(
        config: AppConfig,
        surface: Arc<dyn NotificationSurface>,
        permission: PermissionControl,
    ) -> Result<Self> {
        let selector = ContentSelector::new(config.catalog.clone());
        Self::build_with_selector(config, selector, surface, permission)
    }

    pub fn build_with_selector(
        config: AppConfig,
        selector: ContentSelector,
        surface: Arc<dyn NotificationSurface>,
        permission: PermissionControl,
    ) -> Result<Self> {
        let sink = Arc::new(DeliverySink::new(
            Arc::clone(&surface),
            ChannelSpec {
                id: config.channel.id.clone(),
                name: config.channel.name.clone(),
                description: config.channel.description.clone(),
            },
            config.channel.notification_id,
        ));
        sink.establish_channel()
            .context("Failed to establish notification channel")?;

        let runner = Arc::new(ExecutionRunner::new(
            Arc::new(selector),
            permission.provider(),
            Arc::clone(&sink),
        ));
        let host = Arc::new(TokioTriggerHost::new(config.retry.clone()));
        let registry = Arc::new(JobRegistry::new(
            host.clone(),
            runner,
            config.run_once_delay,
        ));

        let spec = JobSpec::new(config.job_name.clone(), config.interval, config.policy)
            .context("Invalid periodic job configuration")?;
        let controller = Arc::new(Controller::new(
            Arc::clone(&registry),
            permission.provider(),
            spec,
        ));

        info!(
            job = %config.job_name,
            interval = ?config.interval,
            catalog_entries = config.catalog.len(),
            permission_granted = controller.permission_granted(),
            "Guide notifier ready"
        );

        Ok(Self {
            config,
            host,
            registry,
            controller,
            sink,
            surface,
            permission,
        })
    }

    /// Stop every schedule. Executions already running finish on their own.
    pub fn shutdown(&self) {
        self.controller.stop_periodic();
        self.host.shutdown();
    }
}
