//! Node executor contract and type-tag dispatch registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use runtime::ActivityError;
use serde::{Deserialize, Serialize};

/// Result reported by a node executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    /// Whether the node's work succeeded.
    pub success: bool,
    /// Executor-specific output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error description when the executor reports a soft failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeResult {
    /// A successful result carrying output data.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// One unit of externally-visible work behind a node type tag.
///
/// Executors are simple request/response wrappers: they must not retry
/// internally; retry, timeout, and heartbeat enforcement belong to the
/// runtime wrapper driving them.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Executes the node against its opaque configuration.
    async fn execute(&self, data: &serde_json::Value) -> Result<NodeResult, ActivityError>;
}

/// Maps node type tags to executor implementations.
///
/// New node types are supported by registering an executor, without
/// modifying the processor.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an executor for a type tag, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(kind.into(), executor);
    }

    /// Returns the executor for a type tag, if registered.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(kind).cloned()
    }

    /// Returns the registered type tags, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
