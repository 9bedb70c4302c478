//! API Models
//!
//! Request and response bodies for the REST API, annotated for OpenAPI
//! documentation with `utoipa`.

use healthcare_core::llm_client::{ChatMessage, RealtimeSession};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct RootResponse {
    #[schema(example = "Healthcare Chat API is running")]
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
}

/// Everything a browser needs to open a realtime connection directly with the provider.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SessionResponse {
    #[schema(example = "sess_BBwZc7cFV3XizEyKGDCGL")]
    pub session_id: String,
    pub ephemeral_key: String,
    #[schema(example = "gpt-4o-realtime-preview-2024-12-17")]
    pub model: String,
    #[schema(example = json!(["audio", "text"]))]
    pub modalities: Vec<String>,
}

impl From<RealtimeSession> for SessionResponse {
    fn from(session: RealtimeSession) -> Self {
        Self {
            session_id: session.session_id,
            ephemeral_key: session.ephemeral_key,
            model: session.model,
            modalities: session.modalities,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ChatCompletionPayload {
    /// Conversation so far, oldest first. Each entry needs a `role`.
    #[serde(default)]
    #[schema(value_type = Vec<Object>, example = json!([{"role": "user", "content": "Hi"}]))]
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}
