//! Retry policy
//!
//! Decides which responses are retried and how long to wait in between.
//! The wait before retry `n` (1-indexed) is `backoff_factor * 2^(n-1)` seconds.

use std::collections::HashSet;
use std::time::Duration;

/// Retry and backoff settings for one agent
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff factor in seconds
    pub backoff_factor: f64,
    /// Statuses that trigger a retry
    pub retry_status_codes: HashSet<u16>,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-indexed)
    ///
    /// Retry `0` and non-positive factors yield no delay.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = retry.saturating_sub(1).min(1023) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Whether a response with this status should be retried
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }

    /// Whether another retry is allowed after `retries_done` retries
    pub fn has_budget(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }
}

#[cfg(test)]
mod retry_tests {
    use super::*;
    use crate::http::DEFAULT_RETRY_STATUS_CODES;
    use test_case::test_case;

    fn policy(factor: f64) -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            backoff_factor: factor,
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.into_iter().collect(),
        }
    }

    #[test_case(0.5, 1, 500 ; "first retry at half a second")]
    #[test_case(0.5, 2, 1_000 ; "second retry doubles")]
    #[test_case(0.5, 3, 2_000 ; "third retry doubles again")]
    #[test_case(1.0, 4, 8_000 ; "factor one")]
    #[test_case(0.1, 1, 100 ; "small factor")]
    fn test_backoff_schedule(factor: f64, retry: u32, expected_ms: u64) {
        assert_eq!(
            policy(factor).backoff(retry),
            Duration::from_millis(expected_ms)
        );
    }

    #[test]
    fn test_backoff_zero_and_negative_factor() {
        assert_eq!(policy(0.0).backoff(2), Duration::ZERO);
        assert_eq!(policy(-1.0).backoff(2), Duration::ZERO);
        assert_eq!(policy(f64::NAN).backoff(1), Duration::ZERO);
        assert_eq!(policy(0.5).backoff(0), Duration::ZERO);
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(policy(1.0).backoff(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_retry_status_membership() {
        let policy = policy(0.5);
        for status in [429, 500, 502, 503, 504] {
            assert!(policy.should_retry_status(status));
        }
        assert!(!policy.should_retry_status(200));
        assert!(!policy.should_retry_status(404));
        assert!(!policy.should_retry_status(501));
    }

    #[test]
    fn test_budget() {
        let policy = policy(0.5);
        assert!(policy.has_budget(0));
        assert!(policy.has_budget(2));
        assert!(!policy.has_budget(3));
    }
}
