//! Detached child processes (abandon close policy).

use std::future::Future;

use tokio::task::JoinHandle;

use crate::error::ActivityFailure;

/// Spawns a fire-and-forget child process.
///
/// The parent workflow never awaits the child and its outcome cannot
/// affect the parent's result; success and failure are logged only.
/// The join handle is returned for callers that want to observe the
/// child in tests.
pub fn spawn_detached<F, T>(name: impl Into<String>, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<T, ActivityFailure>> + Send + 'static,
    T: Send + 'static,
{
    let name = name.into();
    tokio::spawn(async move {
        match future.await {
            Ok(_) => tracing::debug!(child = %name, "detached child completed"),
            Err(e) => tracing::warn!(child = %name, error = %e, "detached child failed"),
        }
    })
}
