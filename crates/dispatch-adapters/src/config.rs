use anyhow::{anyhow, Context, Result};
use dispatch_core::DispatchConfig;

use crate::inference::LlmInference;
use crate::shell::default_shell_program;

/// Runtime configuration assembled from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Set for any OpenAI-compatible server; Groq when absent.
    pub ai_base_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub probe_enabled: bool,
    pub shell_program: String,
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    /// Loads `.env` (best-effort) and reads `ROUTER_*` variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut dispatch = DispatchConfig::default();
        if let Some(raw) = var("ROUTER_AI_TIMEOUT_SECS") {
            dispatch.inference_timeout_secs = parse_number("ROUTER_AI_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = var("ROUTER_CLASSIFY_TIMEOUT_MS") {
            dispatch.classify_timeout_ms = parse_number("ROUTER_CLASSIFY_TIMEOUT_MS", &raw)?;
        }

        let probe_enabled = match var("ROUTER_PROBE").map(|v| v.to_ascii_lowercase()) {
            None => true,
            Some(v) => match v.as_str() {
                "on" | "1" | "true" | "yes" => true,
                "off" | "0" | "false" | "no" => false,
                other => return Err(anyhow!("ROUTER_PROBE must be 'on' or 'off', got '{}'", other)),
            },
        };

        Ok(Self {
            ai_base_url: var("ROUTER_AI_BASE_URL"),
            ai_api_key: var("ROUTER_AI_API_KEY").or_else(|| var("GROQ_API_KEY")),
            ai_model: var("ROUTER_AI_MODEL").unwrap_or_else(|| llm::DEFAULT_MODEL.to_string()),
            probe_enabled,
            shell_program: var("ROUTER_SHELL").unwrap_or_else(default_shell_program),
            dispatch,
        })
    }

    pub fn provider(&self) -> llm::Provider {
        match &self.ai_base_url {
            Some(base_url) => llm::Provider::OpenAiCompatible { base_url: base_url.clone() },
            None => llm::Provider::Groq,
        }
    }

    pub fn llm_client(&self) -> Result<llm::Client> {
        let key = self
            .ai_api_key
            .clone()
            .ok_or_else(|| anyhow!("ROUTER_AI_API_KEY (or GROQ_API_KEY) not set"))?;
        llm::Client::with_timeout(
            self.provider(),
            key,
            self.ai_model.clone(),
            Some(self.dispatch.inference_timeout()),
        )
    }

    /// The configured assistant, or an offline one when no key is available.
    pub fn inference(&self) -> Result<LlmInference> {
        if self.ai_api_key.is_none() {
            return Ok(LlmInference::offline());
        }
        Ok(LlmInference::new(self.llm_client()?))
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .with_context(|| format!("{} must be a whole number, got '{}'", key, raw))
}
