//! Retry policy for failed executions.
//!
//! Implements exponential backoff with configurable parameters.

use super::job::ExecutionOutcome;
use crate::config::RetrySettings;
use std::time::Duration;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of re-attempts. `None` never gives up.
    pub max_retries: Option<u32>,
    /// Delay before the first re-attempt.
    pub initial_backoff: Duration,
    /// Cap for exponential growth.
    pub max_backoff: Duration,
    /// Multiplier applied to backoff after each retry.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Policy for a periodic schedule: backoff starts at the interval, grows up
    /// to `interval * max_backoff_multiple`, and never gives up.
    pub fn periodic(interval: Duration, settings: &RetrySettings) -> Self {
        Self {
            max_retries: None,
            initial_backoff: interval,
            max_backoff: interval.saturating_mul(settings.max_backoff_multiple.max(1)),
            backoff_multiplier: settings.backoff_multiplier,
        }
    }

    /// Policy for a one-off run.
    pub fn one_off(settings: &RetrySettings) -> Self {
        Self {
            max_retries: Some(settings.max_retries),
            initial_backoff: Duration::from_secs(settings.initial_backoff_secs),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            backoff_multiplier: settings.backoff_multiplier,
        }
    }

    /// Backoff before the re-attempt following `retry_count` earlier re-attempts.
    ///
    /// `initial_backoff * multiplier^retry_count`, capped at `max_backoff`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        // f64::min ignores NaN, so 0 * inf still lands on the cap.
        let capped = secs.min(self.max_backoff.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_backoff)
    }

    /// Whether an execution that ended with `outcome` gets another attempt.
    ///
    /// Only retryable failures are retried, and only while under `max_retries`.
    pub fn should_retry(&self, outcome: ExecutionOutcome, retry_count: u32) -> bool {
        outcome == ExecutionOutcome::RetryableFailure
            && self.max_retries.map_or(true, |max| retry_count < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::one_off(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_default() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_retries, Some(5));
        assert_eq!(policy.initial_backoff, secs(30));
        assert_eq!(policy.max_backoff, secs(5 * 60 * 60));
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy {
            max_retries: Some(5),
            initial_backoff: secs(60),
            max_backoff: secs(3600),
            backoff_multiplier: 2.0,
        };

        assert_eq!(policy.backoff(0), secs(60));
        assert_eq!(policy.backoff(1), secs(120));
        assert_eq!(policy.backoff(2), secs(240));
        assert_eq!(policy.backoff(3), secs(480));
        assert_eq!(policy.backoff(4), secs(960));
    }

    #[test]
    fn test_backoff_capping() {
        let policy = RetryPolicy {
            max_retries: Some(10),
            initial_backoff: secs(60),
            max_backoff: secs(300),
            backoff_multiplier: 2.0,
        };

        assert_eq!(policy.backoff(2), secs(240));
        // 480 -> capped
        assert_eq!(policy.backoff(3), secs(300));
        assert_eq!(policy.backoff(5), secs(300));
        assert_eq!(policy.backoff(u32::MAX), secs(300));
    }

    #[test]
    fn test_periodic_policy_scales_with_interval() {
        let settings = RetrySettings {
            max_backoff_multiple: 4,
            backoff_multiplier: 2.0,
            ..Default::default()
        };
        let policy = RetryPolicy::periodic(secs(900), &settings);

        assert_eq!(policy.max_retries, None);
        assert_eq!(policy.backoff(0), secs(900));
        assert_eq!(policy.backoff(1), secs(1800));
        assert_eq!(policy.backoff(2), secs(3600));
        assert_eq!(policy.backoff(3), secs(3600));
    }

    #[test]
    fn test_periodic_never_gives_up() {
        let policy = RetryPolicy::periodic(secs(60), &RetrySettings::default());
        assert!(policy.should_retry(ExecutionOutcome::RetryableFailure, 0));
        assert!(policy.should_retry(ExecutionOutcome::RetryableFailure, 10_000));
    }

    #[test]
    fn test_should_retry_max_retries_exceeded() {
        let policy = RetryPolicy {
            max_retries: Some(3),
            ..Default::default()
        };

        assert!(policy.should_retry(ExecutionOutcome::RetryableFailure, 0));
        assert!(policy.should_retry(ExecutionOutcome::RetryableFailure, 2));
        assert!(!policy.should_retry(ExecutionOutcome::RetryableFailure, 3));
        assert!(!policy.should_retry(ExecutionOutcome::RetryableFailure, 10));
    }

    #[test]
    fn test_success_and_permanent_failure_never_retry() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(ExecutionOutcome::Success, 0));
        assert!(!policy.should_retry(ExecutionOutcome::PermanentFailure, 0));
    }

    #[test]
    fn test_zero_initial_backoff() {
        let policy = RetryPolicy {
            max_retries: Some(5),
            initial_backoff: Duration::ZERO,
            max_backoff: secs(100),
            backoff_multiplier: 2.0,
        };

        assert_eq!(policy.backoff(0), Duration::ZERO);
        assert_eq!(policy.backoff(5), Duration::ZERO);
    }

    #[test]
    fn test_multiplier_of_one() {
        let policy = RetryPolicy {
            max_retries: Some(5),
            initial_backoff: secs(100),
            max_backoff: secs(1000),
            backoff_multiplier: 1.0,
        };

        assert_eq!(policy.backoff(0), secs(100));
        assert_eq!(policy.backoff(10), secs(100));
    }
}
