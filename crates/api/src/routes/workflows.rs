//! Schema workflow endpoints: run and list.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::WorkflowId;
use dag::WorkflowSchema;
use runtime::WorkflowEntry;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub attribute_key: Option<String>,
    pub attribute_value: Option<String>,
}

#[derive(Serialize)]
pub struct RunSchemaResponse {
    pub workflow_id: String,
    pub schema_workflow_id: String,
    pub status: String,
}

/// POST /workflows/run — validate and execute a workflow schema.
///
/// Returns 200 once the whole graph completed; validation problems map
/// to 400 and node failures to 500 with the failing node identified.
#[tracing::instrument(skip(state, schema))]
pub async fn run_schema(
    State(state): State<Arc<AppState>>,
    Json(schema): Json<WorkflowSchema>,
) -> Result<Json<RunSchemaResponse>, ApiError> {
    let workflow_id = WorkflowId::new();
    state.registry.register(
        WorkflowEntry::new(workflow_id, "dag")
            .with_attribute("CustomStringField", schema.workflow_id.clone()),
    );

    state.processor.run(&schema).await?;

    Ok(Json(RunSchemaResponse {
        workflow_id: workflow_id.to_string(),
        schema_workflow_id: schema.workflow_id,
        status: "COMPLETED".to_string(),
    }))
}

/// GET /workflows — list registered workflows, optionally filtered by
/// one search attribute.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<WorkflowEntry>> {
    let entries = match (&params.attribute_key, &params.attribute_value) {
        (Some(key), Some(value)) => state.registry.find_by_attribute(key, value),
        _ => state.registry.list(),
    };
    Json(entries)
}
