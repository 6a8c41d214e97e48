//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestHarness;
//! use guide_notifier::config::PermissionMode;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_run_once() {
//!     let harness = TestHarness::spawn(PermissionMode::Granted);
//!     harness.controller().run_once();
//! }
//! ```

mod constants;
mod harness;
mod tasks;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use harness::{test_config, TestHarness};
#[allow(unused_imports)]
pub use tasks::{CountingTask, FlakyTask, GatedTask, SlowTask};
