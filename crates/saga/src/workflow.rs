//! The order saga driver.
//!
//! Phase order is fixed: payment must succeed before any inventory work
//! starts. Inventory updates always fan out in parallel, one activity
//! per item. If an inventory update fails, the payment is cancelled by a
//! compensating transaction and the saga fails with the inventory cause.
//! Cancellation is observed at suspension points and takes priority over
//! an in-flight phase error once raised.

use common::{OrderId, UserId};
use futures_util::future::try_join_all;
use tokio_util::sync::CancellationToken;

use runtime::{invoke_activity, spawn_detached};

use crate::activities::{InventoryStore, Notifier, PaymentGateway};
use crate::error::SagaError;
use crate::handle::OrderHandle;
use crate::policy::SagaPolicies;
use crate::state::OrderStatus;

/// Drives a two-phase order transaction with compensation.
pub struct OrderSaga<P, I, N> {
    payment: P,
    inventory: I,
    notifier: N,
    policies: SagaPolicies,
}

impl<P, I, N> OrderSaga<P, I, N>
where
    P: PaymentGateway,
    I: InventoryStore,
    N: Notifier + Clone + 'static,
{
    /// Creates a saga with the default per-activity-class policies.
    pub fn new(payment: P, inventory: I, notifier: N) -> Self {
        Self::with_policies(payment, inventory, notifier, SagaPolicies::default())
    }

    /// Creates a saga with explicit policies (test isolation, custom
    /// timeout profiles).
    pub fn with_policies(payment: P, inventory: I, notifier: N, policies: SagaPolicies) -> Self {
        Self {
            payment,
            inventory,
            notifier,
            policies,
        }
    }

    /// Runs the order saga to completion.
    ///
    /// `handle` must be the handle created for this order via
    /// [`OrderHandle::for_order`]; it carries the items and total amount
    /// and stays valid for queries and signals for the whole run.
    ///
    /// Returns the success descriptor, the cancellation descriptor if the
    /// cancel signal was observed, or the failing phase's error.
    #[tracing::instrument(skip(self, handle), fields(workflow = "order"))]
    pub async fn run(
        &self,
        order_id: OrderId,
        user_id: UserId,
        handle: OrderHandle,
    ) -> Result<String, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let result = self.run_phases(order_id, user_id, &handle).await;
        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());

        match result {
            Ok(message) => {
                metrics::counter!("saga_completed").increment(1);
                tracing::info!(%order_id, "order saga completed successfully");
                Ok(message)
            }
            // Cancellation wins over an in-flight phase error once observed.
            Err(_) if handle.is_cancelled() => {
                metrics::counter!("saga_cancelled").increment(1);
                tracing::info!(%order_id, "order saga cancelled");
                Ok(format!("Order {order_id} was cancelled"))
            }
            Err(e) => {
                metrics::counter!("saga_failed").increment(1);
                tracing::warn!(%order_id, error = %e, "order saga failed");
                Err(e)
            }
        }
    }

    async fn run_phases(
        &self,
        order_id: OrderId,
        user_id: UserId,
        handle: &OrderHandle,
    ) -> Result<String, SagaError> {
        let cancel = handle.cancellation_token().clone();

        // Phase 1: payment.
        if cancel.is_cancelled() {
            return Err(SagaError::Cancelled);
        }
        handle.update(|s| s.set_status(OrderStatus::ProcessingPayment));
        tracing::info!(%order_id, phase = "process_payment", "saga phase started");

        let total = handle.total_amount();
        match invoke_activity("process_payment", &self.policies.payment, &cancel, move |_ctx| {
            self.payment.charge(order_id, total)
        })
        .await
        {
            Ok(confirmation) => {
                handle.update(|s| s.record_payment_success());
                tracing::info!(%order_id, payment_id = %confirmation.payment_id, "payment processed");
            }
            Err(failure) if failure.is_cancelled() => return Err(SagaError::Cancelled),
            Err(failure) => {
                handle.update(|s| s.set_status(OrderStatus::PaymentFailed));
                return Err(SagaError::PaymentFailed(failure));
            }
        }

        // Phase 2: inventory, one activity per item, always in parallel.
        // Items appended by signal up to this point participate.
        if cancel.is_cancelled() {
            return Err(SagaError::Cancelled);
        }
        handle.update(|s| s.set_status(OrderStatus::UpdatingInventory));
        tracing::info!(%order_id, phase = "update_inventory", "saga phase started");

        let items = handle.items();
        let updates = items.iter().map(|item| {
            invoke_activity(
                "update_inventory",
                &self.policies.inventory,
                &cancel,
                move |_ctx| self.inventory.adjust(&item.product_id, item.quantity),
            )
        });
        match try_join_all(updates).await {
            Ok(_) => {
                handle.update(|s| s.record_inventory_success());
                tracing::info!(%order_id, items = items.len(), "inventory updated");
            }
            Err(failure) if failure.is_cancelled() => return Err(SagaError::Cancelled),
            Err(failure) => {
                self.compensate_payment(order_id, &cancel).await;
                handle.update(|s| s.set_status(OrderStatus::InventoryFailed));
                return Err(SagaError::InventoryFailed(failure));
            }
        }

        // Detached notification: abandon policy, the parent neither waits
        // for it nor depends on its outcome.
        let notifier = self.notifier.clone();
        let options = self.policies.notification.clone();
        let message = format!("Order {order_id} has been processed successfully");
        spawn_detached("send_notification", async move {
            let detached = CancellationToken::new();
            invoke_activity("send_notification", &options, &detached, |_ctx| {
                notifier.notify(user_id, &message)
            })
            .await
        });

        handle.update(|s| s.set_status(OrderStatus::Completed));
        Ok(format!("Order {order_id} processed successfully"))
    }

    /// Compensating transaction: cancels the payment after an inventory
    /// failure. Best-effort: its own failure is reported but never masks
    /// the inventory failure that triggered it.
    async fn compensate_payment(&self, order_id: OrderId, cancel: &CancellationToken) {
        tracing::info!(%order_id, "compensating: cancelling payment");
        match invoke_activity("cancel_payment", &self.policies.payment, cancel, move |_ctx| {
            self.payment.cancel(order_id)
        })
        .await
        {
            Ok(()) => tracing::info!(%order_id, "payment cancelled"),
            Err(e) => {
                metrics::counter!("saga_compensation_failures").increment(1);
                tracing::warn!(%order_id, error = %e, "compensating cancel-payment failed");
            }
        }
    }
}
