//! Upstream LLM Provider Client
//!
//! Everything that leaves the process goes through [`LLMClient`]. The service never
//! interprets what the provider sends back: chat completions are relayed as raw JSON,
//! and realtime sessions are reduced to the handful of fields a browser needs to
//! connect on its own.

use crate::agent::ToolSchema;
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
        FunctionObject,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// The realtime model every session is minted for.
pub const REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";
/// The default chat-completion model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Failures talking to the upstream provider.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Request to upstream provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Error code: {status} - {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    OpenAI(#[from] OpenAIError),
    #[error("Upstream provider returned an unreadable response: {0}")]
    Decode(#[from] serde_json::Error),
}

// --- Realtime Sessions ---

/// A channel a realtime session can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Audio,
    Text,
}

/// The body sent when minting a realtime session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealtimeSessionRequest {
    pub model: String,
    pub modalities: Vec<Modality>,
}

impl Default for RealtimeSessionRequest {
    fn default() -> Self {
        Self {
            model: REALTIME_MODEL.to_string(),
            modalities: vec![Modality::Audio, Modality::Text],
        }
    }
}

/// A freshly minted realtime session. Nothing about it is retained server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeSession {
    pub session_id: String,
    pub ephemeral_key: String,
    pub model: String,
    pub modalities: Vec<String>,
}

#[derive(Deserialize)]
struct RealtimeSessionResponse {
    id: String,
    model: String,
    #[serde(default)]
    modalities: Vec<String>,
    client_secret: ClientSecret,
}

#[derive(Deserialize)]
struct ClientSecret {
    value: String,
}

/// Decodes a successful `/realtime/sessions` body.
fn parse_realtime_session(body: &str) -> Result<RealtimeSession, UpstreamError> {
    let response: RealtimeSessionResponse = serde_json::from_str(body)?;
    Ok(response.into())
}

impl From<RealtimeSessionResponse> for RealtimeSession {
    fn from(response: RealtimeSessionResponse) -> Self {
        Self {
            session_id: response.id,
            ephemeral_key: response.client_secret.value,
            model: response.model,
            modalities: response.modalities,
        }
    }
}

// --- Chat Completions ---

/// One conversation message as the caller sent it.
///
/// Only `role` is inspected; every other field (`content`, `tool_calls`,
/// `tool_call_id`, `name`, ...) is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// The exact body forwarded to the chat-completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ChatCompletionTool>,
    pub tool_choice: ChatCompletionToolChoiceOption,
}

impl ChatCompletionRequest {
    /// Builds a request that offers `tools` to the model and lets it decide whether
    /// to call one.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        tools: &[ToolSchema],
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: tools.iter().map(to_chat_tool).collect(),
            tool_choice: ChatCompletionToolChoiceOption::Auto,
        }
    }
}

/// Wraps a flat tool schema in the `{"type": "function", "function": {...}}` envelope
/// the chat-completion API expects.
fn to_chat_tool(tool: &ToolSchema) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            parameters: Some(tool.parameters.clone()),
            strict: None,
        },
    }
}

// --- Client ---

/// A client for the upstream conversational-AI provider.
///
/// The credential is passed on every call so the caller decides, per request,
/// whether one is configured at all.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Mints a realtime session and returns its ephemeral credential.
    async fn create_realtime_session(
        &self,
        api_key: &str,
        request: RealtimeSessionRequest,
    ) -> Result<RealtimeSession, UpstreamError>;

    /// Makes a single, non-streaming chat-completion call and returns the raw response.
    async fn create_chat_completion(
        &self,
        api_key: &str,
        request: ChatCompletionRequest,
    ) -> Result<Value, UpstreamError>;
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    http: reqwest::Client,
    api_base: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL of the provider, e.g. `https://api.openai.com/v1`.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// A per-call SDK handle that shares this client's connection pool.
    fn openai(&self, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&self.api_base);
        Client::with_config(config)
            .with_http_client(self.http.clone())
            .with_backoff(single_attempt())
    }
}

/// The SDK retries rate-limited calls on its own; every call here is a single attempt.
fn single_attempt() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    }
}

/// Pulls `error.message` out of a provider error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Builds the error for a non-success response. An empty or unreadable body falls
/// back to the status reason so the message is never blank.
fn api_error(status: reqwest::StatusCode, body: &str) -> UpstreamError {
    let message = match extract_error_message(body) {
        message if message.is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        message => message,
    };
    UpstreamError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn create_realtime_session(
        &self,
        api_key: &str,
        request: RealtimeSessionRequest,
    ) -> Result<RealtimeSession, UpstreamError> {
        let url = format!("{}/realtime/sessions", self.api_base);
        info!(model = %request.model, modalities = ?request.modalities, "Creating realtime session");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let body = response.text().await?;
        let session = parse_realtime_session(&body)?;
        debug!(session_id = %session.session_id, "Realtime session created");
        Ok(session)
    }

    async fn create_chat_completion(
        &self,
        api_key: &str,
        request: ChatCompletionRequest,
    ) -> Result<Value, UpstreamError> {
        info!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Forwarding chat completion"
        );
        let response: Value = self.openai(api_key).chat().create_byot(&request).await?;
        Ok(response)
    }
}
