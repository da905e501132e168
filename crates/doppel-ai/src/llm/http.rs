//! OpenAI-compatible `/chat/completions` client.
//!
//! Each call is a single HTTP request. Retry and backoff on transient
//! failures are not done here or by the pipelines; wrap the backend if a
//! deployment needs them.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use doppel_core::config::LlmConfig;
use doppel_core::interfaces::{ChatMessage, CompletionBackend};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpCompletionBackend {
    api_base: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    chat_max_tokens: u32,
    json_mode: bool,
    client: reqwest::Client,
}

impl HttpCompletionBackend {
    /// Build a backend for `model` using endpoint settings from `config`.
    pub fn new(config: &LlmConfig, model: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key(),
            model: model.to_string(),
            temperature: config.temperature,
            chat_max_tokens: config.chat_max_tokens,
            json_mode: config.json_mode,
            client,
        })
    }

    /// Backend for chat turns (`llm.chat_model`).
    pub fn for_chat(config: &LlmConfig) -> anyhow::Result<Self> {
        Self::new(config, &config.chat_model)
    }

    /// Backend for extraction and synthesis (`llm.analysis_model`).
    pub fn for_analysis(config: &LlmConfig) -> anyhow::Result<Self> {
        Self::new(config, &config.analysis_model)
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let started = std::time::Instant::now();
        let res = builder
            .send()
            .await
            .with_context(|| format!("completion request to {url} failed"))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            bail!("completion endpoint returned {status}: {body}");
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .context("completion response was not valid JSON")?;
        tracing::debug!(
            model = %self.model,
            duration_ms = started.elapsed().as_millis() as u64,
            "completion received"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("completion endpoint returned no content"))
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn generate_chat_completion(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(self.chat_max_tokens),
            response_format: None,
        };
        self.complete(&request).await
    }

    async fn generate_structured_completion(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: u32,
    ) -> anyhow::Result<String> {
        let messages = [ChatMessage::system(system), ChatMessage::user(prompt)];
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: None,
            max_tokens: Some(max_tokens),
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };
        self.complete(&request).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
