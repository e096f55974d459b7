//! Activity error types.

use thiserror::Error;

/// Error class assigned to attempts that exceed the start-to-close timeout.
pub const TIMEOUT_CLASS: &str = "TIMEOUT";

/// Error class assigned to attempts that go silent past the heartbeat window.
pub const HEARTBEAT_TIMEOUT_CLASS: &str = "HEARTBEAT_TIMEOUT";

/// An error raised by a single activity attempt.
///
/// Carries a class tag that retry policies match against their
/// non-retryable sets (e.g. `PAYMENT_ERROR`, `INVENTORY_ERROR`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{class}: {message}")]
pub struct ActivityError {
    class: String,
    message: String,
}

impl ActivityError {
    /// Creates a new activity error with the given class tag.
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }

    /// Creates a start-to-close timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TIMEOUT_CLASS, message)
    }

    /// Creates a heartbeat timeout error.
    pub fn heartbeat_timeout(message: impl Into<String>) -> Self {
        Self::new(HEARTBEAT_TIMEOUT_CLASS, message)
    }

    /// Returns the error class tag.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Terminal outcome of an activity invocation, surfaced to workflow logic
/// only after the runtime's retry budget is spent (or bypassed).
#[derive(Debug, Error)]
pub enum ActivityFailure {
    /// The last attempt's error class was declared non-retryable by policy.
    #[error("activity '{activity}' failed: {cause}")]
    NonRetryable {
        activity: String,
        cause: ActivityError,
    },

    /// Every attempt allowed by the policy failed.
    #[error("activity '{activity}' failed after {attempts} attempts: {cause}")]
    Exhausted {
        activity: String,
        attempts: u32,
        cause: ActivityError,
    },

    /// Cooperative cancellation was observed before the next attempt.
    #[error("activity '{activity}' was cancelled")]
    Cancelled { activity: String },
}

impl ActivityFailure {
    /// Returns the name of the failed activity.
    pub fn activity(&self) -> &str {
        match self {
            ActivityFailure::NonRetryable { activity, .. }
            | ActivityFailure::Exhausted { activity, .. }
            | ActivityFailure::Cancelled { activity } => activity,
        }
    }

    /// Returns the underlying attempt error, if the failure carries one.
    pub fn cause(&self) -> Option<&ActivityError> {
        match self {
            ActivityFailure::NonRetryable { cause, .. }
            | ActivityFailure::Exhausted { cause, .. } => Some(cause),
            ActivityFailure::Cancelled { .. } => None,
        }
    }

    /// Returns the class tag of the underlying error, if any.
    pub fn class(&self) -> Option<&str> {
        self.cause().map(ActivityError::class)
    }

    /// Returns true if this failure is an observed cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ActivityFailure::Cancelled { .. })
    }
}
