//! Declarative workflow schema: typed nodes, edges, execution settings.
//!
//! The schema is external JSON input (camelCase on the wire) and is
//! immutable once a run starts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DagError;

/// A declarative workflow: a directed graph of typed nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSchema {
    /// Caller-assigned workflow identifier.
    pub workflow_id: String,
    /// Human-readable workflow name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    /// The typed work items.
    pub nodes: Vec<WorkflowNode>,
    /// Directed edges between node ids.
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    /// Execution mode and retry policy for the whole run.
    pub execution: ExecutionSettings,
}

/// One typed work item in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique node id within the schema.
    pub id: String,
    /// Executor type tag (e.g. "sendgrid", "postgres", "webhook").
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque configuration handed to the executor.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A directed edge from one node to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub from: String,
    pub to: String,
}

/// How a node's children (and the starting nodes) are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Children run one at a time, in edge-declaration order.
    Sequential,
    /// Children run concurrently and are joined.
    Parallel,
}

/// Execution settings for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSettings {
    pub mode: ExecutionMode,
    #[serde(default)]
    pub retry_policy: SchemaRetryPolicy,
}

/// Retry policy applied uniformly to every node invocation in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRetryPolicy {
    /// Maximum attempts per node, including the first.
    #[serde(default = "SchemaRetryPolicy::default_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff interval in milliseconds.
    #[serde(default = "SchemaRetryPolicy::default_initial_interval_ms")]
    pub initial_interval_ms: u64,
}

impl SchemaRetryPolicy {
    fn default_max_attempts() -> u32 {
        3
    }

    fn default_initial_interval_ms() -> u64 {
        1000
    }
}

impl Default for SchemaRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            initial_interval_ms: Self::default_initial_interval_ms(),
        }
    }
}

impl WorkflowSchema {
    /// Checks structural validity: unique node ids, edges between known
    /// nodes, at least one starting node.
    pub fn validate(&self) -> Result<(), DagError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(DagError::Validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        for edge in &self.edges {
            if !seen.contains(edge.from.as_str()) {
                return Err(DagError::Validation(format!(
                    "edge references unknown node '{}'",
                    edge.from
                )));
            }
            if !seen.contains(edge.to.as_str()) {
                return Err(DagError::Validation(format!(
                    "edge references unknown node '{}'",
                    edge.to
                )));
            }
        }

        if self.starting_nodes().is_empty() {
            return Err(DagError::Validation(
                "no starting nodes found in workflow".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the node with the given id, if present.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns nodes with no incoming edge, in declaration order.
    pub fn starting_nodes(&self) -> Vec<&WorkflowNode> {
        let targets: HashSet<&str> = self.edges.iter().map(|e| e.to.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| !targets.contains(n.id.as_str()))
            .collect()
    }

    /// Returns a node's children via outgoing edges, in edge-declaration
    /// order.
    pub fn children_of(&self, node_id: &str) -> Vec<&WorkflowNode> {
        self.edges
            .iter()
            .filter(|e| e.from == node_id)
            .filter_map(|e| self.node(&e.to))
            .collect()
    }
}
