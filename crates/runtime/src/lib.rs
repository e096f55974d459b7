//! Boundary to the durable-execution runtime.
//!
//! Workflow components never talk to activity implementations directly.
//! Every unit of externally-visible work goes through [`invoke_activity`],
//! which applies the caller's [`ActivityOptions`]: a per-attempt
//! start-to-close timeout, optional heartbeat monitoring, bounded retry
//! with exponential backoff, and non-retryable error classification.
//! Cancellation is cooperative: it is observed between attempts, never
//! by aborting an attempt that is already in flight.
//!
//! The crate also provides [`spawn_detached`] for fire-and-forget child
//! processes (abandon close policy) and [`WorkflowRegistry`], the
//! client-facing list/search surface over running workflow instances.

pub mod activity;
pub mod child;
pub mod context;
pub mod error;
pub mod policy;
pub mod registry;

pub use activity::invoke_activity;
pub use child::spawn_detached;
pub use context::ActivityContext;
pub use error::{ActivityError, ActivityFailure, HEARTBEAT_TIMEOUT_CLASS, TIMEOUT_CLASS};
pub use policy::{ActivityOptions, RetryPolicy};
pub use registry::{WorkflowEntry, WorkflowRegistry};
