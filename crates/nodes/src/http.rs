//! HTTP webhook node executor.

use std::collections::HashMap;

use async_trait::async_trait;
use dag::{NodeExecutor, NodeResult};
use runtime::ActivityError;
use serde::Deserialize;
use serde_json::json;

/// Error class for webhook call failures.
pub const WEBHOOK_ERROR: &str = "WEBHOOK_ERROR";

#[derive(Debug, Deserialize)]
struct WebhookNodeConfig {
    url: String,
    #[serde(default = "WebhookNodeConfig::default_method")]
    method: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<serde_json::Value>,
}

impl WebhookNodeConfig {
    fn default_method() -> String {
        "GET".to_string()
    }
}

/// Makes one HTTP request per invocation.
///
/// Transport failures and non-2xx responses both fail the node; the
/// response body (JSON when possible, text otherwise) is reported on
/// success.
#[derive(Debug, Clone, Default)]
pub struct WebhookExecutor {
    client: reqwest::Client,
}

impl WebhookExecutor {
    /// Creates a new webhook executor.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeExecutor for WebhookExecutor {
    async fn execute(&self, data: &serde_json::Value) -> Result<NodeResult, ActivityError> {
        let config: WebhookNodeConfig = serde_json::from_value(data.clone()).map_err(|e| {
            ActivityError::new(WEBHOOK_ERROR, format!("invalid webhook node data: {e}"))
        })?;

        let method = reqwest::Method::from_bytes(config.method.to_uppercase().as_bytes())
            .map_err(|_| {
                ActivityError::new(
                    WEBHOOK_ERROR,
                    format!("invalid http method '{}'", config.method),
                )
            })?;

        let mut request = self.client.request(method, &config.url);
        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &config.body {
            request = request.json(body);
        }

        tracing::debug!(url = %config.url, "calling webhook");
        let response = request
            .send()
            .await
            .map_err(|e| ActivityError::new(WEBHOOK_ERROR, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActivityError::new(
                WEBHOOK_ERROR,
                format!("webhook responded with status {status}"),
            ));
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<serde_json::Value>(&text)
            .unwrap_or(serde_json::Value::String(text));

        Ok(NodeResult::ok(json!({
            "status": status.as_u16(),
            "body": body,
        })))
    }
}
