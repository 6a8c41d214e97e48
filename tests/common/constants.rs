//! Shared constants for end-to-end tests

#![allow(dead_code)]

use std::time::Duration;

/// Name of the periodic job every test registers
pub const JOB_NAME: &str = "tourist-guide-periodic";

/// Interval of the periodic job in the default test config
pub const INTERVAL: Duration = Duration::from_secs(60);

/// Delay before a one-off run in the default test config
pub const RUN_ONCE_DELAY: Duration = Duration::from_secs(1);

/// Seed of the selector's random generator
pub const SELECTOR_SEED: u64 = 20_240_601;

/// Two-entry test catalog: (title, description)
pub const CATALOG: [(&str, &str); 2] = [("A", "descA"), ("B", "descB")];

/// Notification id every delivery is posted under
pub const NOTIFICATION_ID: u32 = 1001;
