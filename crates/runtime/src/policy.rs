//! Retry and timeout policies applied to activity invocations.

use std::time::Duration;

/// Bounded exponential backoff with non-retryable error classes.
///
/// The delay before attempt `n + 1` is
/// `min(initial_interval * backoff_coefficient^(n - 1), maximum_interval)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    initial_interval: Duration,
    maximum_interval: Duration,
    backoff_coefficient: f64,
    maximum_attempts: u32,
    non_retryable_error_classes: Vec<String>,
}

impl RetryPolicy {
    /// Creates a retry policy with no non-retryable classes.
    pub fn new(
        initial_interval: Duration,
        maximum_interval: Duration,
        backoff_coefficient: f64,
        maximum_attempts: u32,
    ) -> Self {
        Self {
            initial_interval,
            maximum_interval,
            backoff_coefficient,
            // At least one attempt is always made.
            maximum_attempts: maximum_attempts.max(1),
            non_retryable_error_classes: Vec::new(),
        }
    }

    /// Declares an error class as non-retryable under this policy.
    pub fn non_retryable_on(mut self, class: impl Into<String>) -> Self {
        self.non_retryable_error_classes.push(class.into());
        self
    }

    /// Returns the maximum number of attempts (including the first).
    pub fn maximum_attempts(&self) -> u32 {
        self.maximum_attempts
    }

    /// Returns true if the given error class must not be retried.
    pub fn is_non_retryable(&self, class: &str) -> bool {
        self.non_retryable_error_classes.iter().any(|c| c == class)
    }

    /// Returns the backoff delay after the given (1-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_coefficient.powi(exponent);
        let delay = self.initial_interval.mul_f64(factor);
        delay.min(self.maximum_interval)
    }
}

impl Default for RetryPolicy {
    /// One second initial interval, one minute cap, doubling, three attempts.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 2.0, 3)
    }
}

/// Per-activity-class invocation options: timeouts plus retry policy.
#[derive(Debug, Clone)]
pub struct ActivityOptions {
    start_to_close_timeout: Duration,
    heartbeat_timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl ActivityOptions {
    /// Creates options with the given start-to-close timeout, no heartbeat
    /// monitoring, and the default retry policy.
    pub fn new(start_to_close_timeout: Duration) -> Self {
        Self {
            start_to_close_timeout,
            heartbeat_timeout: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Enables heartbeat monitoring with the given window.
    pub fn with_heartbeat_timeout(mut self, heartbeat_timeout: Duration) -> Self {
        self.heartbeat_timeout = Some(heartbeat_timeout);
        self
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the per-attempt start-to-close timeout.
    pub fn start_to_close_timeout(&self) -> Duration {
        self.start_to_close_timeout
    }

    /// Returns the heartbeat window, if monitoring is enabled.
    pub fn heartbeat_timeout(&self) -> Option<Duration> {
        self.heartbeat_timeout
    }

    /// Returns the retry policy.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl Default for ActivityOptions {
    /// One minute start-to-close, no heartbeat, default retry.
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.maximum_attempts(), 3);
        assert!(!policy.is_non_retryable("PAYMENT_ERROR"));
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(60),
            2.0,
            5,
        );
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_clamped_to_maximum_interval() {
        let policy = RetryPolicy::new(
            Duration::from_secs(2),
            Duration::from_secs(30),
            2.0,
            10,
        );
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(30));
    }

    #[test]
    fn test_non_retryable_classes() {
        let policy = RetryPolicy::default()
            .non_retryable_on("PAYMENT_ERROR")
            .non_retryable_on("INVENTORY_ERROR");
        assert!(policy.is_non_retryable("PAYMENT_ERROR"));
        assert!(policy.is_non_retryable("INVENTORY_ERROR"));
        assert!(!policy.is_non_retryable("NETWORK"));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(1), 2.0, 0);
        assert_eq!(policy.maximum_attempts(), 1);
    }

    #[test]
    fn test_options_builders() {
        let options = ActivityOptions::new(Duration::from_secs(120))
            .with_heartbeat_timeout(Duration::from_secs(10))
            .with_retry(RetryPolicy::default().non_retryable_on("PAYMENT_ERROR"));

        assert_eq!(options.start_to_close_timeout(), Duration::from_secs(120));
        assert_eq!(options.heartbeat_timeout(), Some(Duration::from_secs(10)));
        assert!(options.retry().is_non_retryable("PAYMENT_ERROR"));
    }
}
