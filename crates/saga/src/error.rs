//! Saga error types.

use runtime::ActivityFailure;
use thiserror::Error;

/// Errors surfaced to callers of the order saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The payment phase failed. No inventory was touched, so nothing is
    /// compensated.
    #[error("Payment failed: {0}")]
    PaymentFailed(ActivityFailure),

    /// An inventory update failed after payment succeeded. The payment
    /// was compensated (best-effort) before this was raised.
    #[error("Inventory update failed: {0}")]
    InventoryFailed(ActivityFailure),

    /// Cooperative cancellation was observed at a suspension point.
    /// Converted to a cancellation result string before reaching callers.
    #[error("order workflow cancelled")]
    Cancelled,
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
