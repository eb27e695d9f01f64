//! # Reconnect Policy Module
//!
//! Bounded or unbounded reconnect attempts with a fixed pause between them.

use std::time::Duration;

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

/// Reconnect policy for a call site
///
/// # Examples
///
/// ```rust
/// use dataq_runtime::retry::RetryPolicy;
/// use std::time::Duration;
///
/// // Direct calls give up after three attempts
/// let processor = RetryPolicy::bounded(3, Duration::from_secs(10));
/// assert!(processor.allows_attempt(2));
/// assert!(!processor.allows_attempt(3));
///
/// // Background polling never gives up
/// let source = RetryPolicy::unbounded(Duration::from_secs(10));
/// assert!(source.allows_attempt(u32::MAX));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of reconnect attempts, negative for no limit
    pub max_attempts: i32,

    /// Pause after a failed attempt
    pub wait_between_attempts: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::bounded(3, Duration::from_secs(10))
    }
}

impl RetryPolicy {
    /// Create a policy from the conventional attempts value (`-1` = unbounded)
    pub fn new(max_attempts: i32, wait_between_attempts: Duration) -> Self {
        Self {
            max_attempts,
            wait_between_attempts,
        }
    }

    pub fn bounded(max_attempts: u32, wait_between_attempts: Duration) -> Self {
        Self::new(
            i32::try_from(max_attempts).unwrap_or(i32::MAX),
            wait_between_attempts,
        )
    }

    pub fn unbounded(wait_between_attempts: Duration) -> Self {
        Self::new(-1, wait_between_attempts)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts < 0
    }

    /// Check if another attempt is allowed after `attempts_made` attempts
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dataq_runtime::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::bounded(0, Duration::ZERO);
    /// assert!(!policy.allows_attempt(0));
    /// ```
    pub fn allows_attempt(&self, attempts_made: u32) -> bool {
        match u32::try_from(self.max_attempts) {
            Ok(max) => attempts_made < max,
            Err(_) => true,
        }
    }
}
