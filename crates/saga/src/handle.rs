//! Query/signal handle for a running order saga.

use std::sync::{Arc, RwLock};

use common::{Money, OrderItem};
use tokio_util::sync::CancellationToken;

use crate::state::{OrderProgress, OrderState};

/// Shared handle to one running order workflow.
///
/// Queries return point-in-time snapshots; signals are the only external
/// mutation entry points. Handlers and the saga driver synchronize on a
/// single lock that is never held across a suspension point, so a query
/// issued right after a signal always reflects the signal's effect.
#[derive(Debug, Clone)]
pub struct OrderHandle {
    state: Arc<RwLock<OrderState>>,
    cancel: CancellationToken,
}

impl OrderHandle {
    /// Creates the handle for a new order: status `PROCESSING`, zero
    /// progress, cancellation not requested.
    pub fn for_order(items: Vec<OrderItem>, total_amount: Money) -> Self {
        Self {
            state: Arc::new(RwLock::new(OrderState::new(items, total_amount))),
            cancel: CancellationToken::new(),
        }
    }

    // --- queries ---

    /// Returns a full snapshot of the order state.
    pub fn status(&self) -> OrderState {
        self.state.read().unwrap().clone()
    }

    /// Returns a progress-only snapshot.
    pub fn progress(&self) -> OrderProgress {
        self.state.read().unwrap().progress()
    }

    // --- signals ---

    /// Appends an item to the order. A no-op once the order is cancelled
    /// or terminal; returns whether the item was accepted.
    pub fn add_item(&self, item: OrderItem) -> bool {
        self.state.write().unwrap().add_item(item)
    }

    /// Requests cooperative cancellation (one-way). The saga observes the
    /// flag at its next suspension point; in-flight activities are not
    /// forcibly interrupted.
    pub fn cancel(&self) {
        self.state.write().unwrap().cancel();
        self.cancel.cancel();
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.read().unwrap().is_cancelled()
    }

    // --- driver-side accessors ---

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn total_amount(&self) -> Money {
        self.state.read().unwrap().total_amount()
    }

    pub(crate) fn items(&self) -> Vec<OrderItem> {
        self.state.read().unwrap().items().to_vec()
    }

    pub(crate) fn update(&self, mutate: impl FnOnce(&mut OrderState)) {
        mutate(&mut self.state.write().unwrap());
    }
}
