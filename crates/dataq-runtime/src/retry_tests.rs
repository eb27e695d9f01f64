//! Tests for reconnect policy module

use super::*;
use std::time::Duration;

#[test]
fn test_retry_policy_default_values() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.wait_between_attempts, Duration::from_secs(10));
    assert!(!policy.is_unbounded());
}

#[test]
fn test_bounded_policy_limits_attempts() {
    let policy = RetryPolicy::bounded(3, Duration::from_millis(500));

    assert!(policy.allows_attempt(0));
    assert!(policy.allows_attempt(2));
    assert!(!policy.allows_attempt(3));
    assert!(!policy.allows_attempt(10));
}

#[test]
fn test_negative_attempts_mean_unbounded() {
    let policy = RetryPolicy::new(-1, Duration::from_secs(10));

    assert!(policy.is_unbounded());
    assert!(policy.allows_attempt(0));
    assert!(policy.allows_attempt(1_000_000));
    assert_eq!(policy, RetryPolicy::unbounded(Duration::from_secs(10)));
}

#[test]
fn test_zero_attempts_never_allows() {
    let policy = RetryPolicy::bounded(0, Duration::ZERO);
    assert!(!policy.allows_attempt(0));
}

#[test]
fn test_bounded_saturates_large_values() {
    let policy = RetryPolicy::bounded(u32::MAX, Duration::ZERO);
    assert_eq!(policy.max_attempts, i32::MAX);
    assert!(!policy.is_unbounded());
}
