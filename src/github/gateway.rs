use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// One entry from the response's `errors` list. The `type` discriminator is
/// what lets callers tell a stale node id (`NOT_FOUND`) apart from everything
/// else.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote rejected the operation: {}", summarize(.0))]
    Protocol(Vec<RemoteError>),
    #[error("response missing expected shape: {0}")]
    Schema(String),
}

impl GatewayError {
    /// True when the remote reported that a referenced node no longer exists.
    /// Callers treat this as a stale cached id and re-provision.
    pub fn is_not_found(&self) -> bool {
        match self {
            GatewayError::Protocol(errors) => errors
                .iter()
                .any(|e| e.kind.as_deref() == Some("NOT_FOUND")),
            _ => false,
        }
    }
}

fn summarize(errors: &[RemoteError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<Value>,
    errors: Option<Vec<RemoteError>>,
}

/// Thin GraphQL transport: posts `{query, variables}` with bearer auth and
/// decodes the envelope once, so everything above works with typed payloads.
pub struct GraphqlGateway {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl GraphqlGateway {
    pub fn new(token: &str) -> Self {
        Self::with_endpoint(GITHUB_GRAPHQL_URL, token)
    }

    pub fn with_endpoint(endpoint: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn execute<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: Value,
    ) -> Result<T, GatewayError> {
        let body = serde_json::json!({ "query": document, "variables": variables });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            // GitHub rejects requests without a User-Agent.
            .header(reqwest::header::USER_AGENT, "boardsync")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|e| GatewayError::Schema(format!("invalid response envelope: {e}")))?;

        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                return Err(GatewayError::Protocol(errors));
            }
        }
        let data = envelope
            .data
            .ok_or_else(|| GatewayError::Schema("response carried neither data nor errors".into()))?;
        serde_json::from_value(data).map_err(|e| GatewayError::Schema(e.to_string()))
    }
}
