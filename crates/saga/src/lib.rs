//! Saga pattern implementation for order processing.
//!
//! This crate drives a two-phase order transaction as a durable,
//! signalable workflow:
//! 1. Process payment (must succeed first)
//! 2. Update inventory for every item, in parallel
//!
//! If an inventory update fails after the payment succeeded, the payment
//! is cancelled by a compensating transaction. The workflow state is
//! queryable for its whole lifetime, items can be appended by signal,
//! and cancellation is cooperative: a cancel signal is observed at the
//! next suspension point and unwinds the saga.

pub mod activities;
pub mod error;
pub mod handle;
pub mod policy;
pub mod state;
pub mod workflow;

pub use activities::{
    AdjustmentConfirmation, INVENTORY_ERROR, InMemoryInventoryStore, InMemoryNotifier,
    InMemoryPaymentGateway, InventoryStore, Notifier, PAYMENT_ERROR, PaymentConfirmation,
    PaymentGateway,
};
pub use error::SagaError;
pub use handle::OrderHandle;
pub use policy::SagaPolicies;
pub use state::{OrderProgress, OrderState, OrderStatus};
pub use workflow::OrderSaga;
