//! Reasoning service client (OpenAI-compatible chat completions).
//!
//! One opaque request/response operation: the caller owns the conversation
//! history and the client appends nothing. When the caller expects JSON the
//! request asks the service for forced structured output, but the service is
//! not trusted to honor it; downstream validation is mandatory either way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use vesta_common::{ChatMessage, VestaError};

/// Everything one reasoning call needs. Built by callers, including the full
/// ordered role-tagged history.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
    /// Request the service's structured-output mode. Set whenever the
    /// active validator expects JSON.
    pub force_json: bool,
}

/// Seam for the generative service, mockable in tests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// One completion call; returns the raw assistant text.
    async fn chat(&self, request: &ChatRequest) -> Result<String, VestaError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantTurn,
}

#[derive(Deserialize)]
struct AssistantTurn {
    content: String,
}

/// Client for a Qwen/OpenAI compatible-mode endpoint.
pub struct QwenClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

fn reasoning_err(e: reqwest::Error) -> VestaError {
    VestaError::Reasoning(e.to_string())
}

impl QwenClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, VestaError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(reasoning_err)?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for QwenClient {
    async fn chat(&self, request: &ChatRequest) -> Result<String, VestaError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &request.model,
            temperature: request.temperature,
            messages: &request.messages,
            response_format: request
                .force_json
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        info!(
            "[>]  LLM CALL [{}] temperature={} turns={}",
            request.model,
            request.temperature,
            request.messages.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(reasoning_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VestaError::Reasoning(format!(
                "service returned {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(reasoning_err)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| VestaError::Reasoning("empty choices in completion".into()))?;

        debug!("[<]  LLM RESPONSE ({} chars)", content.len());
        Ok(content)
    }
}
