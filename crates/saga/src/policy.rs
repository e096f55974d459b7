//! Per-activity-class invocation policies.

use std::time::Duration;

use runtime::{ActivityOptions, RetryPolicy};

use crate::activities::{INVENTORY_ERROR, PAYMENT_ERROR};

/// Invocation policies for the activity classes the saga dispatches.
///
/// Passed explicitly into [`OrderSaga`] so tests and concurrent workflow
/// sets can carry their own policy configuration.
///
/// [`OrderSaga`]: crate::workflow::OrderSaga
#[derive(Debug, Clone)]
pub struct SagaPolicies {
    /// Applied to `process_payment` and the compensating `cancel_payment`.
    pub payment: ActivityOptions,
    /// Applied to each `update_inventory` invocation.
    pub inventory: ActivityOptions,
    /// Applied to the detached `send_notification` child.
    pub notification: ActivityOptions,
}

impl Default for SagaPolicies {
    /// Production presets: payments get the longest timeout and the
    /// biggest retry budget, inventory updates are short-lived, and
    /// notifications use the base profile.
    fn default() -> Self {
        Self {
            payment: ActivityOptions::new(Duration::from_secs(120))
                .with_heartbeat_timeout(Duration::from_secs(10))
                .with_retry(
                    RetryPolicy::new(Duration::from_secs(2), Duration::from_secs(30), 2.0, 5)
                        .non_retryable_on(PAYMENT_ERROR),
                ),
            inventory: ActivityOptions::new(Duration::from_secs(30))
                .with_heartbeat_timeout(Duration::from_secs(5))
                .with_retry(
                    RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(10), 2.0, 3)
                        .non_retryable_on(INVENTORY_ERROR),
                ),
            notification: ActivityOptions::new(Duration::from_secs(60)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_policy_presets() {
        let policies = SagaPolicies::default();

        assert_eq!(
            policies.payment.start_to_close_timeout(),
            Duration::from_secs(120)
        );
        assert_eq!(
            policies.payment.heartbeat_timeout(),
            Some(Duration::from_secs(10))
        );
        assert_eq!(policies.payment.retry().maximum_attempts(), 5);
        assert!(policies.payment.retry().is_non_retryable(PAYMENT_ERROR));
        assert!(!policies.payment.retry().is_non_retryable(INVENTORY_ERROR));
    }

    #[test]
    fn test_inventory_policy_presets() {
        let policies = SagaPolicies::default();

        assert_eq!(
            policies.inventory.start_to_close_timeout(),
            Duration::from_secs(30)
        );
        assert_eq!(
            policies.inventory.heartbeat_timeout(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(policies.inventory.retry().maximum_attempts(), 3);
        assert!(policies.inventory.retry().is_non_retryable(INVENTORY_ERROR));
    }

    #[test]
    fn test_notification_policy_has_no_heartbeat() {
        let policies = SagaPolicies::default();
        assert!(policies.notification.heartbeat_timeout().is_none());
        assert_eq!(policies.notification.retry().maximum_attempts(), 3);
    }
}
