//! Schema-driven DAG workflow processor.
//!
//! Takes a declarative graph of typed nodes and edges and executes it,
//! dispatching each node through an [`ExecutorRegistry`] to a
//! type-specific [`NodeExecutor`]. A single schema-level execution mode
//! governs fan-out (sequential or parallel) and one retry policy derived
//! from the schema applies uniformly to every node invocation in the run.
//!
//! The processor keeps no per-traversal state: a node reachable via
//! multiple paths is executed once per path, failures propagate without
//! rolling back completed nodes, and sibling branches are not explicitly
//! cancelled. Compensation lives in the saga layer, not here.

pub mod error;
pub mod executor;
pub mod processor;
pub mod schema;

pub use error::DagError;
pub use executor::{ExecutorRegistry, NodeExecutor, NodeResult};
pub use processor::DagProcessor;
pub use schema::{
    ExecutionMode, ExecutionSettings, SchemaRetryPolicy, WorkflowEdge, WorkflowNode,
    WorkflowSchema,
};
