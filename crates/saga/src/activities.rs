//! Activity collaborator contracts and in-memory implementations.
//!
//! Each collaborator performs one unit of externally-visible work and
//! reports success or failure. None of them retry internally; retry,
//! timeout, and heartbeat enforcement belong to the runtime wrapper.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};
use runtime::ActivityError;

/// Error class for domain-level payment rejections (non-retryable).
pub const PAYMENT_ERROR: &str = "PAYMENT_ERROR";

/// Error class for domain-level inventory rejections (non-retryable).
pub const INVENTORY_ERROR: &str = "INVENTORY_ERROR";

/// Result of a successful payment charge.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    /// The payment ID assigned by the gateway.
    pub payment_id: String,
}

/// Result of a successful inventory adjustment.
#[derive(Debug, Clone)]
pub struct AdjustmentConfirmation {
    /// The adjustment ID assigned by the inventory store.
    pub adjustment_id: String,
}

/// Payment processing operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the order amount.
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentConfirmation, ActivityError>;

    /// Compensating action: cancels a previously successful charge.
    async fn cancel(&self, order_id: OrderId) -> Result<(), ActivityError>;
}

/// Inventory adjustment operations.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Commits an inventory adjustment for one product.
    async fn adjust(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<AdjustmentConfirmation, ActivityError>;
}

/// User notification delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a message to the user.
    async fn notify(&self, user_id: UserId, message: &str) -> Result<(), ActivityError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: HashMap<String, (OrderId, Money)>,
    cancelled_orders: Vec<OrderId>,
    next_id: u32,
    charge_attempts: u32,
    fail_on_charge: bool,
    transient_failures: u32,
    fail_on_cancel: bool,
    charge_delay: Option<Duration>,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures charges to fail with a domain error (`PAYMENT_ERROR`).
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_charge = fail;
    }

    /// Configures the next `count` charge attempts to fail with a
    /// retryable transport error.
    pub fn set_transient_failures(&self, count: u32) {
        self.state.write().unwrap().transient_failures = count;
    }

    /// Configures the compensating cancel call to fail.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cancel = fail;
    }

    /// Adds an artificial delay to every charge call.
    pub fn set_charge_delay(&self, delay: Duration) {
        self.state.write().unwrap().charge_delay = Some(delay);
    }

    /// Returns the number of charges currently held.
    pub fn payment_count(&self) -> usize {
        self.state.read().unwrap().payments.len()
    }

    /// Returns the total number of charge attempts made.
    pub fn charge_attempts(&self) -> u32 {
        self.state.read().unwrap().charge_attempts
    }

    /// Returns the orders whose payments were cancelled, in call order.
    pub fn cancelled_orders(&self) -> Vec<OrderId> {
        self.state.read().unwrap().cancelled_orders.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentConfirmation, ActivityError> {
        let delay = self.state.read().unwrap().charge_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        state.charge_attempts += 1;

        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(ActivityError::new("NETWORK", "payment gateway unreachable"));
        }

        if state.fail_on_charge {
            return Err(ActivityError::new(
                PAYMENT_ERROR,
                format!("Payment declined for order {order_id}"),
            ));
        }

        state.next_id += 1;
        let payment_id = format!("PAY-{:04}", state.next_id);
        state.payments.insert(payment_id.clone(), (order_id, amount));

        Ok(PaymentConfirmation { payment_id })
    }

    async fn cancel(&self, order_id: OrderId) -> Result<(), ActivityError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_cancel {
            return Err(ActivityError::new(
                PAYMENT_ERROR,
                format!("Unable to cancel payment for order {order_id}"),
            ));
        }

        state.payments.retain(|_, (oid, _)| *oid != order_id);
        state.cancelled_orders.push(order_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    adjustments: Vec<(ProductId, u32)>,
    next_id: u32,
    adjust_attempts: u32,
    fail_on_adjust: bool,
    fail_product: Option<ProductId>,
    transient_failures: u32,
}

/// In-memory inventory store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryStore {
    /// Creates a new in-memory inventory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every adjustment to fail with `INVENTORY_ERROR`.
    pub fn set_fail_on_adjust(&self, fail: bool) {
        self.state.write().unwrap().fail_on_adjust = fail;
    }

    /// Configures adjustments for one product to fail with
    /// `INVENTORY_ERROR` while other products succeed.
    pub fn set_fail_for_product(&self, product_id: impl Into<ProductId>) {
        self.state.write().unwrap().fail_product = Some(product_id.into());
    }

    /// Configures the next `count` adjustment attempts to fail with a
    /// retryable transport error.
    pub fn set_transient_failures(&self, count: u32) {
        self.state.write().unwrap().transient_failures = count;
    }

    /// Returns the number of committed adjustments.
    pub fn adjustment_count(&self) -> usize {
        self.state.read().unwrap().adjustments.len()
    }

    /// Returns the total number of adjustment attempts made.
    pub fn adjust_attempts(&self) -> u32 {
        self.state.read().unwrap().adjust_attempts
    }

    /// Returns the committed adjustments, in call order.
    pub fn adjustments(&self) -> Vec<(ProductId, u32)> {
        self.state.read().unwrap().adjustments.clone()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn adjust(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<AdjustmentConfirmation, ActivityError> {
        let mut state = self.state.write().unwrap();
        state.adjust_attempts += 1;

        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(ActivityError::new("NETWORK", "inventory store unreachable"));
        }

        if state.fail_on_adjust || state.fail_product.as_ref() == Some(product_id) {
            return Err(ActivityError::new(
                INVENTORY_ERROR,
                format!("Insufficient inventory for product {product_id}"),
            ));
        }

        state.next_id += 1;
        let adjustment_id = format!("ADJ-{:04}", state.next_id);
        state.adjustments.push((product_id.clone(), quantity));

        Ok(AdjustmentConfirmation { adjustment_id })
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    notifications: Vec<(UserId, String)>,
    fail_on_notify: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures deliveries to fail.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the number of delivered notifications.
    pub fn notification_count(&self) -> usize {
        self.state.read().unwrap().notifications.len()
    }

    /// Returns the delivered notifications, in call order.
    pub fn notifications(&self) -> Vec<(UserId, String)> {
        self.state.read().unwrap().notifications.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, user_id: UserId, message: &str) -> Result<(), ActivityError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_notify {
            return Err(ActivityError::new("NETWORK", "notification channel down"));
        }

        state.notifications.push((user_id, message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_charge_and_cancel() {
        let gateway = InMemoryPaymentGateway::new();
        let order_id = OrderId::new();

        let confirmation = gateway
            .charge(order_id, Money::from_cents(5000))
            .await
            .unwrap();
        assert!(confirmation.payment_id.starts_with("PAY-"));
        assert_eq!(gateway.payment_count(), 1);

        gateway.cancel(order_id).await.unwrap();
        assert_eq!(gateway.payment_count(), 0);
        assert_eq!(gateway.cancelled_orders(), vec![order_id]);
    }

    #[tokio::test]
    async fn test_fail_on_charge_uses_payment_class() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_charge(true);

        let err = gateway
            .charge(OrderId::new(), Money::from_cents(5000))
            .await
            .unwrap_err();
        assert_eq!(err.class(), PAYMENT_ERROR);
        assert_eq!(gateway.payment_count(), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_transient_failures(2);
        let order_id = OrderId::new();

        assert!(gateway.charge(order_id, Money::zero()).await.is_err());
        assert!(gateway.charge(order_id, Money::zero()).await.is_err());
        assert!(gateway.charge(order_id, Money::zero()).await.is_ok());
        assert_eq!(gateway.charge_attempts(), 3);
    }

    #[tokio::test]
    async fn test_sequential_payment_ids() {
        let gateway = InMemoryPaymentGateway::new();
        let order_id = OrderId::new();

        let r1 = gateway.charge(order_id, Money::zero()).await.unwrap();
        let r2 = gateway.charge(order_id, Money::zero()).await.unwrap();

        assert_eq!(r1.payment_id, "PAY-0001");
        assert_eq!(r2.payment_id, "PAY-0002");
    }

    #[tokio::test]
    async fn test_adjust_and_record() {
        let store = InMemoryInventoryStore::new();
        let product = ProductId::new("SKU-001");

        let confirmation = store.adjust(&product, 2).await.unwrap();
        assert!(confirmation.adjustment_id.starts_with("ADJ-"));
        assert_eq!(store.adjustment_count(), 1);
        assert_eq!(store.adjustments(), vec![(product, 2)]);
    }

    #[tokio::test]
    async fn test_fail_for_single_product() {
        let store = InMemoryInventoryStore::new();
        store.set_fail_for_product("SKU-BAD");

        assert!(store.adjust(&ProductId::new("SKU-001"), 1).await.is_ok());
        let err = store
            .adjust(&ProductId::new("SKU-BAD"), 1)
            .await
            .unwrap_err();
        assert_eq!(err.class(), INVENTORY_ERROR);
    }

    #[tokio::test]
    async fn test_notifier_records_messages() {
        let notifier = InMemoryNotifier::new();
        let user_id = UserId::new();

        notifier.notify(user_id, "order shipped").await.unwrap();
        assert_eq!(notifier.notification_count(), 1);
        assert_eq!(
            notifier.notifications(),
            vec![(user_id, "order shipped".to_string())]
        );
    }
}
