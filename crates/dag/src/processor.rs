//! Graph traversal engine.

use std::time::Duration;

use futures_util::future::{BoxFuture, try_join_all};
use tokio_util::sync::CancellationToken;

use runtime::{ActivityOptions, RetryPolicy, invoke_activity};

use crate::error::DagError;
use crate::executor::ExecutorRegistry;
use crate::schema::{ExecutionMode, SchemaRetryPolicy, WorkflowNode, WorkflowSchema};

/// Per-node start-to-close timeout for schema runs.
const NODE_START_TO_CLOSE: Duration = Duration::from_secs(300);

/// Backoff cap for schema-derived retry policies.
const NODE_MAXIMUM_INTERVAL: Duration = Duration::from_secs(60);

/// Executes declarative workflow schemas.
///
/// Every node invocation in a run shares one retry policy derived from
/// the schema, distinct from the saga's per-activity-class policies.
pub struct DagProcessor {
    registry: ExecutorRegistry,
}

impl DagProcessor {
    /// Creates a processor dispatching through the given registry.
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }

    /// Returns the executor registry.
    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Runs a workflow schema to completion.
    ///
    /// Fails with [`DagError::Validation`] before any node executes if
    /// the schema is malformed. On a node failure the error identifies
    /// the failing node; nodes that already completed are not rolled
    /// back.
    #[tracing::instrument(skip(self, schema), fields(workflow_id = %schema.workflow_id))]
    pub async fn run(&self, schema: &WorkflowSchema) -> Result<(), DagError> {
        metrics::counter!("dag_runs_total").increment(1);
        schema.validate()?;

        let options = node_options(&schema.execution.retry_policy);
        let cancel = CancellationToken::new();

        let result = self.run_starting_nodes(schema, &options, &cancel).await;
        match &result {
            Ok(()) => {
                metrics::counter!("dag_runs_completed").increment(1);
                tracing::info!("workflow completed successfully");
            }
            Err(e) => {
                metrics::counter!("dag_runs_failed").increment(1);
                tracing::error!(error = %e, "workflow failed");
            }
        }
        result
    }

    async fn run_starting_nodes(
        &self,
        schema: &WorkflowSchema,
        options: &ActivityOptions,
        cancel: &CancellationToken,
    ) -> Result<(), DagError> {
        let starts = schema.starting_nodes();
        match schema.execution.mode {
            ExecutionMode::Parallel => {
                try_join_all(
                    starts
                        .into_iter()
                        .map(|node| self.process_node(node, schema, options, cancel)),
                )
                .await?;
            }
            ExecutionMode::Sequential => {
                for node in starts {
                    self.process_node(node, schema, options, cancel).await?;
                }
            }
        }
        Ok(())
    }

    /// Executes one node, then its children per the schema's mode.
    ///
    /// Boxed because the traversal recurses through the graph.
    fn process_node<'a>(
        &'a self,
        node: &'a WorkflowNode,
        schema: &'a WorkflowSchema,
        options: &'a ActivityOptions,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), DagError>> {
        Box::pin(async move {
            tracing::info!(node_id = %node.id, node_type = %node.kind, "starting node execution");

            let outcome = match self.registry.get(&node.kind) {
                Some(executor) => {
                    let activity = format!("node:{}", node.id);
                    invoke_activity(&activity, options, cancel, |_ctx| {
                        executor.execute(&node.data)
                    })
                    .await
                    .map_err(|source| DagError::NodeFailed {
                        node_id: node.id.clone(),
                        source,
                    })
                }
                None => Err(DagError::UnsupportedNodeType {
                    node_id: node.id.clone(),
                    kind: node.kind.clone(),
                }),
            };

            // Log the result, including failures, before propagating.
            match outcome {
                Ok(result) => {
                    metrics::counter!("dag_nodes_executed_total").increment(1);
                    tracing::info!(
                        node_id = %node.id,
                        success = result.success,
                        "node executed successfully"
                    );
                }
                Err(e) => {
                    metrics::counter!("dag_node_failures_total").increment(1);
                    tracing::error!(node_id = %node.id, error = %e, "node execution failed");
                    return Err(e);
                }
            }

            let children = schema.children_of(&node.id);
            match schema.execution.mode {
                ExecutionMode::Parallel => {
                    try_join_all(
                        children
                            .into_iter()
                            .map(|child| self.process_node(child, schema, options, cancel)),
                    )
                    .await?;
                }
                ExecutionMode::Sequential => {
                    for child in children {
                        self.process_node(child, schema, options, cancel).await?;
                    }
                }
            }

            Ok(())
        })
    }
}

/// Derives the uniform per-node invocation options from a schema's retry
/// policy.
fn node_options(retry: &SchemaRetryPolicy) -> ActivityOptions {
    ActivityOptions::new(NODE_START_TO_CLOSE).with_retry(RetryPolicy::new(
        Duration::from_millis(retry.initial_interval_ms),
        NODE_MAXIMUM_INTERVAL,
        2.0,
        retry.max_attempts,
    ))
}
