//! SendGrid email node executor.

use async_trait::async_trait;
use dag::{NodeExecutor, NodeResult};
use runtime::ActivityError;
use serde::Deserialize;
use serde_json::json;

/// Error class for email delivery failures.
pub const EMAIL_ERROR: &str = "EMAIL_ERROR";

const DEFAULT_API_BASE: &str = "https://api.sendgrid.com";

// The node payload nests the mail parameters under data.config, split
// into connection credentials and the message itself.
#[derive(Debug, Deserialize)]
struct EmailEnvelope {
    data: EmailData,
}

#[derive(Debug, Deserialize)]
struct EmailData {
    config: EmailConfig,
}

#[derive(Debug, Deserialize)]
struct EmailConfig {
    connection: ConnectionConfig,
    email: MessageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionConfig {
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MessageConfig {
    to: String,
    from: String,
    subject: String,
    #[serde(default)]
    body: MessageBody,
}

#[derive(Debug, Deserialize, Default)]
struct MessageBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    html: Option<String>,
}

fn parse_config(data: &serde_json::Value) -> Result<EmailConfig, ActivityError> {
    let envelope: EmailEnvelope = serde_json::from_value(data.clone())
        .map_err(|e| ActivityError::new(EMAIL_ERROR, format!("invalid sendgrid node data: {e}")))?;
    Ok(envelope.data.config)
}

/// Sends mail through the SendGrid v3 API.
#[derive(Debug, Clone)]
pub struct EmailExecutor {
    client: reqwest::Client,
    api_base: String,
}

impl EmailExecutor {
    /// Creates an executor against the production SendGrid endpoint.
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Creates an executor against a custom endpoint (test servers).
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }
}

impl Default for EmailExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for EmailExecutor {
    async fn execute(&self, data: &serde_json::Value) -> Result<NodeResult, ActivityError> {
        let config = parse_config(data)?;

        let mut content = Vec::new();
        if let Some(text) = &config.email.body.text {
            content.push(json!({"type": "text/plain", "value": text}));
        }
        if let Some(html) = &config.email.body.html {
            content.push(json!({"type": "text/html", "value": html}));
        }
        if content.is_empty() {
            content.push(json!({"type": "text/plain", "value": ""}));
        }

        let payload = json!({
            "personalizations": [{"to": [{"email": config.email.to}]}],
            "from": {"email": config.email.from},
            "subject": config.email.subject,
            "content": content,
        });

        tracing::debug!(to = %config.email.to, "sending email");
        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(&config.connection.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ActivityError::new(EMAIL_ERROR, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActivityError::new(
                EMAIL_ERROR,
                format!("sendgrid responded with status {status}"),
            ));
        }

        Ok(NodeResult::ok(json!({
            "statusCode": status.as_u16(),
            "to": config.email.to,
        })))
    }
}
