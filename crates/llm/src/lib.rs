use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client as Http;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Clone, Debug, PartialEq)]
pub enum Provider {
    Groq,
    /// Any server speaking the chat completions wire format.
    OpenAiCompatible { base_url: String },
}

impl Provider {
    pub fn base_url(&self) -> &str {
        match self {
            Provider::Groq => GROQ_BASE_URL,
            Provider::OpenAiCompatible { base_url } => base_url.trim_end_matches('/'),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::OpenAiCompatible { .. } => "openai-compatible",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    http: Http,
    provider: Provider,
    api_key: String,
    model: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    /// If true, request JSON-only output (`json_object`) when provider supports it.
    pub json_object: bool,
    pub max_tokens: Option<u32>,
}

impl Client {
    pub fn new(provider: Provider, api_key: String, model: String) -> Result<Self> {
        Self::with_timeout(provider, api_key, model, None)
    }

    /// `timeout` bounds each whole request, connect included.
    pub fn with_timeout(
        provider: Provider,
        api_key: String,
        model: String,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Http::builder().pool_max_idle_per_host(8);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self { http: builder.build()?, provider, api_key, model })
    }

    /// Convenience: pick up GROQ_API_KEY from env for Groq.
    pub fn from_env_groq(model: &str) -> Result<Self> {
        let key = std::env::var("GROQ_API_KEY").context("GROQ_API_KEY not set")?;
        Self::new(Provider::Groq, key, model.to_string())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn chat(&self, messages: &[ChatMessage], opts: ChatOptions) -> Result<String> {
        // OpenAI-compatible Chat Completions
        let url = format!("{}/chat/completions", self.provider.base_url());
        let body = request_body(&self.model, messages, &opts);
        debug!(provider = self.provider.label(), model = %self.model, messages = messages.len(), "chat request");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!(
                "{} {}: {}",
                self.provider.label(),
                status,
                resp.text().await.unwrap_or_default()
            ));
        }

        let v: Value = resp.json().await.context("invalid json")?;
        reply_content(&v)
    }

    /// One system message carrying `context`, one user message.
    pub async fn complete(&self, context: &str, prompt: &str) -> Result<String> {
        let mut msgs = Vec::with_capacity(2);
        if !context.trim().is_empty() {
            msgs.push(ChatMessage::system(context));
        }
        msgs.push(ChatMessage::user(prompt));
        self.chat(&msgs, ChatOptions::default()).await
    }

    /// Simple helper for one-shot prompts.
    pub async fn simple(&self, prompt: &str) -> Result<String> {
        self.chat(&[ChatMessage::user(prompt)], ChatOptions::default()).await
    }
}

fn request_body(model: &str, messages: &[ChatMessage], opts: &ChatOptions) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
        "temperature": opts.temperature.unwrap_or(0.0)
    });
    if let Some(map) = body.as_object_mut() {
        if opts.json_object {
            map.insert("response_format".into(), json!({ "type": "json_object" }));
        }
        if let Some(max) = opts.max_tokens {
            map.insert("max_tokens".into(), json!(max));
        }
    }
    body
}

fn reply_content(v: &Value) -> Result<String> {
    v.pointer("/choices/0/message/content")
        .and_then(|x| x.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing choices[0].message.content"))
}
