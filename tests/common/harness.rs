//! Test application lifecycle
//!
//! Each test gets an isolated `App` wired to an in-memory notification
//! surface and a seeded selector. Time-dependent tests run on tokio's paused
//! clock.

#![allow(dead_code)]

use super::constants::*;
use guide_notifier::config::{CatalogEntryConfig, CliConfig, FileConfig, PermissionMode};
use guide_notifier::content::ContentSelector;
use guide_notifier::delivery::MemorySurface;
use guide_notifier::jobs::{FireReport, TriggerHost};
use guide_notifier::{App, AppConfig, Controller, PermissionControl};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Config with the two-entry catalog, a one minute interval and a one second
/// one-off delay.
pub fn test_config() -> AppConfig {
    let cli = CliConfig {
        interval_secs: INTERVAL.as_secs(),
        run_once_delay_secs: RUN_ONCE_DELAY.as_secs(),
        metrics_port: None,
        permission: PermissionMode::Granted,
    };
    let file = FileConfig {
        catalog: Some(
            CATALOG
                .iter()
                .map(|(title, description)| CatalogEntryConfig {
                    title: title.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        ),
        ..Default::default()
    };
    AppConfig::resolve(&cli, Some(file)).expect("Test config should resolve")
}

/// Running application plus handles for inspecting its effects.
///
/// When dropped, every schedule is stopped.
pub struct TestHarness {
    pub app: App,
    pub surface: Arc<MemorySurface>,
    pub reports: broadcast::Receiver<FireReport>,
}

impl TestHarness {
    /// Must be called inside a tokio runtime.
    pub fn spawn(permission: PermissionMode) -> Self {
        Self::with_config(test_config(), permission)
    }

    pub fn with_config(config: AppConfig, permission: PermissionMode) -> Self {
        let surface = Arc::new(MemorySurface::new());
        let selector = ContentSelector::new(config.catalog.clone())
            .with_rng(StdRng::seed_from_u64(SELECTOR_SEED));
        let app = App::build_with_selector(
            config,
            selector,
            surface.clone(),
            PermissionControl::from_mode(permission),
        )
        .expect("Failed to build app");
        let reports = app.host.subscribe();

        Self {
            app,
            surface,
            reports,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.app.controller
    }

    /// Reports received so far, without waiting.
    pub fn drain_reports(&mut self) -> Vec<FireReport> {
        let mut out = Vec::new();
        while let Ok(report) = self.reports.try_recv() {
            out.push(report);
        }
        out
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.app.shutdown();
    }
}
