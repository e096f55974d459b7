//! Postgres SQL node executor.

use async_trait::async_trait;
use dag::{NodeExecutor, NodeResult};
use runtime::ActivityError;
use serde::Deserialize;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;

/// Error class for SQL execution failures.
pub const DATABASE_ERROR: &str = "DATABASE_ERROR";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SqlNodeConfig {
    connection_string: String,
    query: String,
}

/// Executes one SQL statement against a per-node Postgres connection.
///
/// Each invocation connects with the node's own connection string and
/// tears the connection down afterwards; the executor holds no state.
#[derive(Debug, Clone, Default)]
pub struct SqlExecutor;

impl SqlExecutor {
    /// Creates a new SQL executor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NodeExecutor for SqlExecutor {
    async fn execute(&self, data: &serde_json::Value) -> Result<NodeResult, ActivityError> {
        let config: SqlNodeConfig = serde_json::from_value(data.clone()).map_err(|e| {
            ActivityError::new(DATABASE_ERROR, format!("invalid postgres node data: {e}"))
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&config.connection_string)
            .await
            .map_err(|e| ActivityError::new(DATABASE_ERROR, e.to_string()))?;

        tracing::debug!("executing sql statement");
        let outcome = sqlx::query(&config.query).execute(&pool).await;
        pool.close().await;

        let result = outcome.map_err(|e| ActivityError::new(DATABASE_ERROR, e.to_string()))?;

        Ok(NodeResult::ok(json!({
            "rowsAffected": result.rows_affected(),
        })))
    }
}
