//! DAG processor error types.

use runtime::ActivityFailure;
use thiserror::Error;

/// Errors raised by the DAG workflow processor.
#[derive(Debug, Error)]
pub enum DagError {
    /// The schema is malformed (duplicate ids, dangling edges, no
    /// starting node). Raised before any node executes.
    #[error("schema validation failed: {0}")]
    Validation(String),

    /// No executor is registered for the node's type tag.
    #[error("unsupported node type '{kind}' for node '{node_id}'")]
    UnsupportedNodeType { node_id: String, kind: String },

    /// A node invocation failed after the run's retry budget.
    #[error("node '{node_id}' failed: {source}")]
    NodeFailed {
        node_id: String,
        source: ActivityFailure,
    },
}

impl DagError {
    /// Returns the id of the failing node, when the error names one.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            DagError::Validation(_) => None,
            DagError::UnsupportedNodeType { node_id, .. }
            | DagError::NodeFailed { node_id, .. } => Some(node_id),
        }
    }
}
