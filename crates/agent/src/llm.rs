use std::time::Duration;

use async_trait::async_trait;
use concierge_core::config::{LlmConfig, LlmProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Provider default when unset.
    pub temperature: Option<f64>,
    /// Ask the provider for a bare JSON object where it supports that.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages, temperature: None, json_mode: false }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm client is not configured: {0}")]
    Configuration(String),
    #[error("llm transport failed: {0}")]
    Transport(String),
    #[error("llm request timed out after {0}s")]
    Timeout(u64),
    #[error("llm endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
    #[error("llm returned an empty completion")]
    EmptyCompletion,
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Configuration(_) | Self::Decode(_) | Self::EmptyCompletion => false,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_delay_ms: 500, max_delay_ms: 8_000 }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Completion client for OpenAI-compatible, Anthropic, and Ollama endpoints.
pub struct HttpLlmClient {
    http: reqwest::Client,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        config.require_credentials().map_err(|error| LlmError::Configuration(error.to_string()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            provider: config.provider,
            endpoint: config.endpoint().to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            retry: RetryPolicy { max_retries: config.max_retries, ..RetryPolicy::default() },
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_url(&self) -> String {
        request_url(self.provider, &self.endpoint)
    }

    async fn send_once(&self, body: &Value) -> Result<String, LlmError> {
        let mut builder = self.http.post(self.request_url()).json(body);
        if let Some(api_key) = &self.api_key {
            builder = match self.provider {
                LlmProvider::Anthropic => builder
                    .header("x-api-key", api_key.expose_secret())
                    .header("anthropic-version", ANTHROPIC_VERSION),
                LlmProvider::OpenAi | LlmProvider::Ollama => {
                    builder.bearer_auth(api_key.expose_secret())
                }
            };
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                LlmError::Timeout(self.timeout_secs)
            } else {
                LlmError::Transport(error.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body: truncate(&body, 512) });
        }

        let payload: Value =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;
        parse_completion(self.provider, &payload)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = request_body(self.provider, &self.model, &request);

        for attempt in 0..=self.retry.max_retries {
            info!(
                event_name = "agent.llm.request",
                provider = ?self.provider,
                model = %self.model,
                attempt,
                messages = request.messages.len(),
                json_mode = request.json_mode,
                "sending llm completion request"
            );

            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(error) if error.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        event_name = "agent.llm.retry",
                        provider = ?self.provider,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "llm request failed; retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }

        Err(LlmError::Transport("llm retries exhausted".to_string()))
    }
}

fn request_url(provider: LlmProvider, endpoint: &str) -> String {
    match provider {
        LlmProvider::OpenAi => format!("{endpoint}/v1/chat/completions"),
        LlmProvider::Anthropic => format!("{endpoint}/v1/messages"),
        LlmProvider::Ollama => format!("{endpoint}/api/chat"),
    }
}

fn request_body(provider: LlmProvider, model: &str, request: &CompletionRequest) -> Value {
    match provider {
        LlmProvider::OpenAi => {
            let mut body = json!({ "model": model, "messages": request.messages });
            if let Some(temperature) = request.temperature {
                body["temperature"] = json!(temperature);
            }
            if request.json_mode {
                body["response_format"] = json!({ "type": "json_object" });
            }
            body
        }
        LlmProvider::Ollama => {
            let mut body = json!({ "model": model, "messages": request.messages, "stream": false });
            if let Some(temperature) = request.temperature {
                body["options"] = json!({ "temperature": temperature });
            }
            if request.json_mode {
                body["format"] = json!("json");
            }
            body
        }
        LlmProvider::Anthropic => {
            // Anthropic takes the system prompt out of band.
            let system = request
                .messages
                .iter()
                .filter(|message| message.role == Role::System)
                .map(|message| message.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let messages = request
                .messages
                .iter()
                .filter(|message| message.role != Role::System)
                .collect::<Vec<_>>();

            let mut body = json!({
                "model": model,
                "max_tokens": ANTHROPIC_MAX_TOKENS,
                "messages": messages,
            });
            if !system.is_empty() {
                body["system"] = json!(system);
            }
            if let Some(temperature) = request.temperature {
                body["temperature"] = json!(temperature);
            }
            body
        }
    }
}

fn parse_completion(provider: LlmProvider, payload: &Value) -> Result<String, LlmError> {
    let content = match provider {
        LlmProvider::OpenAi => payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string),
        LlmProvider::Ollama => {
            payload.pointer("/message/content").and_then(Value::as_str).map(str::to_string)
        }
        LlmProvider::Anthropic => payload.get("content").and_then(Value::as_array).map(|blocks| {
            blocks
                .iter()
                .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<String>()
        }),
    };

    let content = content.ok_or_else(|| {
        LlmError::Decode(format!("{provider:?} response did not contain message content"))
    })?;
    if content.trim().is_empty() {
        return Err(LlmError::EmptyCompletion);
    }
    Ok(content)
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
