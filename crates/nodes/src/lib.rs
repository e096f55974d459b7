//! Concrete node executors for the DAG workflow processor.
//!
//! Each executor is a thin request/response wrapper behind a node type
//! tag: `sendgrid` sends email, `postgres` executes SQL, `webhook` makes
//! an HTTP call. Executors validate their node configuration, perform
//! exactly one I/O operation, and report the outcome. Cross-invocation
//! retry is the runtime wrapper's job, never theirs.

pub mod email;
pub mod http;
pub mod sql;

use std::sync::Arc;

use dag::ExecutorRegistry;

pub use email::{EMAIL_ERROR, EmailExecutor};
pub use http::{WEBHOOK_ERROR, WebhookExecutor};
pub use sql::{DATABASE_ERROR, SqlExecutor};

/// Builds a registry with the standard executors behind their tags.
pub fn default_registry() -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    registry.register("sendgrid", Arc::new(EmailExecutor::new()));
    registry.register("postgres", Arc::new(SqlExecutor::new()));
    registry.register("webhook", Arc::new(WebhookExecutor::new()));
    registry
}
