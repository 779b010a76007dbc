use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dispatch_core::InferencePort;
use tracing::debug;

/// Assistant backed by an OpenAI-compatible chat endpoint.
///
/// Without a client every request fails, which the dispatcher reports in the
/// conversation like any other backend error.
pub struct LlmInference {
    client: Option<llm::Client>,
}

impl LlmInference {
    pub fn new(client: llm::Client) -> Self {
        Self { client: Some(client) }
    }

    pub fn offline() -> Self {
        Self { client: None }
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }
}

#[async_trait]
impl InferencePort for LlmInference {
    async fn chat(&self, message: &str, conversation_id: &str, context: &str) -> Result<String> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow!("no assistant backend configured"))?;
        debug!(conversation_id, model = client.model(), "sending request to assistant");
        client.complete(context, message).await
    }
}
