//! Order state machine owned by a running saga instance.

use chrono::{DateTime, Utc};
use common::{Money, OrderItem};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order workflow.
///
/// State transitions:
/// ```text
/// PROCESSING ──► PROCESSING_PAYMENT ──┬──► UPDATING_INVENTORY ──┬──► COMPLETED
///                                     └──► PAYMENT_FAILED       └──► INVENTORY_FAILED
/// ```
/// `CANCELLED` may be entered from any non-terminal state; every other
/// transition only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order accepted, no phase started yet.
    #[default]
    Processing,

    /// The payment activity is in flight.
    ProcessingPayment,

    /// The payment phase failed (terminal state).
    PaymentFailed,

    /// Inventory updates are in flight.
    UpdatingInventory,

    /// An inventory update failed and the payment was compensated
    /// (terminal state).
    InventoryFailed,

    /// All phases finished (terminal state).
    Completed,

    /// Cooperative cancellation was observed (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::PaymentFailed
                | OrderStatus::InventoryFailed
                | OrderStatus::Completed
                | OrderStatus::Cancelled
        )
    }

    /// Returns the status name as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::ProcessingPayment => "PROCESSING_PAYMENT",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
            OrderStatus::UpdatingInventory => "UPDATING_INVENTORY",
            OrderStatus::InventoryFailed => "INVENTORY_FAILED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-phase completion percentages, monotonically non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrderProgress {
    /// Payment phase progress (0–100).
    pub payment: u8,
    /// Inventory phase progress (0–100).
    pub inventory: u8,
    /// Overall progress (0–100).
    pub overall: u8,
}

impl OrderProgress {
    fn advance(current: &mut u8, value: u8) {
        *current = (*current).max(value.min(100));
    }

    /// Raises payment progress; never moves backwards.
    pub fn record_payment(&mut self, value: u8) {
        Self::advance(&mut self.payment, value);
    }

    /// Raises inventory progress; never moves backwards.
    pub fn record_inventory(&mut self, value: u8) {
        Self::advance(&mut self.inventory, value);
    }

    /// Raises overall progress; never moves backwards.
    pub fn record_overall(&mut self, value: u8) {
        Self::advance(&mut self.overall, value);
    }
}

/// Mutable state of one running order saga.
///
/// Owned exclusively by a single workflow instance; external code reads
/// snapshots through queries and mutates only through signal handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderState {
    status: OrderStatus,
    items: Vec<OrderItem>,
    total_amount: Money,
    progress: OrderProgress,
    last_updated: DateTime<Utc>,
    cancelled: bool,
}

impl OrderState {
    /// Creates the initial state: `PROCESSING`, zero progress.
    pub fn new(items: Vec<OrderItem>, total_amount: Money) -> Self {
        Self {
            status: OrderStatus::Processing,
            items,
            total_amount,
            progress: OrderProgress::default(),
            last_updated: Utc::now(),
            cancelled: false,
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the order items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the order total, fixed at creation.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the phase progress.
    pub fn progress(&self) -> OrderProgress {
        self.progress
    }

    /// Returns when the state last changed.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Moves to a new status. Ignored once cancelled: cancellation wins
    /// over any phase transition racing with it.
    pub fn set_status(&mut self, status: OrderStatus) {
        if self.status == OrderStatus::Cancelled {
            return;
        }
        self.status = status;
        self.touch();
    }

    /// Appends an item unless the order is cancelled or terminal.
    /// Returns whether the item was accepted.
    pub fn add_item(&mut self, item: OrderItem) -> bool {
        if self.cancelled || self.status.is_terminal() {
            return false;
        }
        self.items.push(item);
        self.touch();
        true
    }

    /// Requests cancellation: one-way flag plus the `CANCELLED` status.
    /// A no-op once the order reached a terminal state.
    pub fn cancel(&mut self) {
        if self.cancelled || self.status.is_terminal() {
            return;
        }
        self.cancelled = true;
        self.status = OrderStatus::Cancelled;
        self.touch();
    }

    /// Records payment success: payment 100%, overall 50%.
    pub fn record_payment_success(&mut self) {
        self.progress.record_payment(100);
        self.progress.record_overall(50);
        self.touch();
    }

    /// Records inventory success: inventory 100%, overall 100%.
    pub fn record_inventory_success(&mut self) {
        self.progress.record_inventory(100);
        self.progress.record_overall(100);
        self.touch();
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> OrderState {
        OrderState::new(
            vec![OrderItem::new("SKU-001", 2), OrderItem::new("SKU-002", 1)],
            Money::from_cents(3500),
        )
    }

    #[test]
    fn test_initial_state() {
        let state = sample_state();
        assert_eq!(state.status(), OrderStatus::Processing);
        assert_eq!(state.items().len(), 2);
        assert_eq!(state.total_amount(), Money::from_cents(3500));
        assert_eq!(state.progress(), OrderProgress::default());
        assert!(!state.is_cancelled());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::ProcessingPayment.is_terminal());
        assert!(!OrderStatus::UpdatingInventory.is_terminal());
        assert!(OrderStatus::PaymentFailed.is_terminal());
        assert!(OrderStatus::InventoryFailed.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_wire_strings() {
        let json = serde_json::to_string(&OrderStatus::ProcessingPayment).unwrap();
        assert_eq!(json, "\"PROCESSING_PAYMENT\"");

        let parsed: OrderStatus = serde_json::from_str("\"UPDATING_INVENTORY\"").unwrap();
        assert_eq!(parsed, OrderStatus::UpdatingInventory);

        assert_eq!(OrderStatus::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut progress = OrderProgress::default();
        progress.record_payment(100);
        progress.record_payment(40);
        assert_eq!(progress.payment, 100);

        progress.record_overall(50);
        progress.record_overall(10);
        assert_eq!(progress.overall, 50);
    }

    #[test]
    fn test_progress_clamped_to_100() {
        let mut progress = OrderProgress::default();
        progress.record_inventory(200);
        assert_eq!(progress.inventory, 100);
    }

    #[test]
    fn test_add_item() {
        let mut state = sample_state();
        assert!(state.add_item(OrderItem::new("SKU-003", 4)));
        assert_eq!(state.items().len(), 3);
    }

    #[test]
    fn test_add_item_rejected_after_cancel() {
        let mut state = sample_state();
        state.cancel();
        assert!(!state.add_item(OrderItem::new("SKU-003", 4)));
        assert_eq!(state.items().len(), 2);
    }

    #[test]
    fn test_add_item_rejected_in_terminal_state() {
        let mut state = sample_state();
        state.set_status(OrderStatus::Completed);
        assert!(!state.add_item(OrderItem::new("SKU-003", 4)));
    }

    #[test]
    fn test_cancel_is_one_way() {
        let mut state = sample_state();
        state.cancel();
        assert!(state.is_cancelled());
        assert_eq!(state.status(), OrderStatus::Cancelled);

        // Phase transitions racing with the cancel are ignored.
        state.set_status(OrderStatus::UpdatingInventory);
        assert_eq!(state.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_after_completion_is_noop() {
        let mut state = sample_state();
        state.set_status(OrderStatus::Completed);
        state.cancel();
        assert!(!state.is_cancelled());
        assert_eq!(state.status(), OrderStatus::Completed);
    }

    #[test]
    fn test_phase_success_recording() {
        let mut state = sample_state();
        state.record_payment_success();
        assert_eq!(state.progress().payment, 100);
        assert_eq!(state.progress().overall, 50);

        state.record_inventory_success();
        assert_eq!(state.progress().inventory, 100);
        assert_eq!(state.progress().overall, 100);
    }

    #[test]
    fn test_mutations_refresh_last_updated() {
        let mut state = sample_state();
        let created = state.last_updated();
        state.set_status(OrderStatus::ProcessingPayment);
        assert!(state.last_updated() >= created);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut state = sample_state();
        state.set_status(OrderStatus::ProcessingPayment);
        state.record_payment_success();

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: OrderState = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.status(), OrderStatus::ProcessingPayment);
        assert_eq!(deserialized.progress().payment, 100);
        assert_eq!(deserialized.items().len(), 2);
    }
}
