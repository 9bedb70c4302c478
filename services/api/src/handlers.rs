//! Axum Handlers for the REST API
//!
//! Each handler is a single request -> forward -> respond step. Nothing is kept
//! between requests; the agent specification is rebuilt every time it is needed.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use healthcare_core::{
    agent::{AgentConfig, build_agent_config_with},
    llm_client::{ChatCompletionRequest, RealtimeSessionRequest},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    config::ConfigError,
    models::{
        ChatCompletionPayload, ErrorResponse, HealthResponse, RootResponse, SessionResponse,
    },
    state::AppState,
};

/// Every way a request can fail. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service is missing something it needs, e.g. the upstream credential.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// The request body is unusable.
    #[error("{0}")]
    Validation(String),
    /// The upstream provider call failed, for any reason.
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) | ApiError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(detail) => warn!(%detail, "Rejected request"),
            ApiError::Configuration(err) => error!(error = %err, "Service misconfigured"),
            ApiError::Upstream(detail) => error!(%detail, "Upstream call failed"),
        }
        let status = self.status_code();
        let detail = self.to_string();
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Liveness banner.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = RootResponse))
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Healthcare Chat API is running".to_string(),
    })
}

/// Health check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Create a realtime session for voice and text chat.
///
/// Makes exactly one call to the provider, always for the fixed realtime model with
/// the `audio` and `text` modalities.
#[utoipa::path(
    post,
    path = "/api/session/create",
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 500, description = "Missing credential or upstream failure", body = ErrorResponse)
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let api_key = state.config.require_api_key()?;

    let session = state
        .llm_client
        .create_realtime_session(api_key, RealtimeSessionRequest::default())
        .await
        .map_err(|e| ApiError::Upstream(format!("Failed to create session: {}", e)))?;

    info!(model = %session.model, "Realtime session issued");
    Ok(Json(session.into()))
}

/// Forward a chat completion request for the healthcare agent.
///
/// The caller's messages are sent as-is together with the agent's tools and
/// `tool_choice = "auto"`. The provider's response, including any tool calls, is
/// returned without interpretation.
#[utoipa::path(
    post,
    path = "/api/chat/completions",
    request_body = ChatCompletionPayload,
    responses(
        (status = 200, description = "Raw chat completion from the provider", body = Object),
        (status = 400, description = "No messages provided", body = ErrorResponse),
        (status = 500, description = "Missing credential or upstream failure", body = ErrorResponse)
    )
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatCompletionPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let api_key = state.config.require_api_key()?;

    let Json(payload) =
        payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    if payload.messages.is_empty() {
        return Err(ApiError::Validation("No messages provided".to_string()));
    }

    let agent = build_agent_config_with(state.clock.as_ref());
    let request =
        ChatCompletionRequest::new(&state.config.chat_model, payload.messages, &agent.tools);

    let response = state
        .llm_client
        .create_chat_completion(api_key, request)
        .await
        .map_err(|e| ApiError::Upstream(format!("Failed to process chat completion: {}", e)))?;

    Ok(Json(response))
}

/// Get the agent specification (instructions and tools) as of now.
///
/// Browser clients use this to configure a realtime session with the same prompt
/// and tools the chat endpoint attaches.
#[utoipa::path(
    get,
    path = "/api/agent/config",
    responses((status = 200, description = "Current agent specification", body = Object))
)]
pub async fn get_agent_config(State(state): State<Arc<AppState>>) -> Json<AgentConfig> {
    Json(build_agent_config_with(state.clock.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        let config = ApiError::Configuration(ConfigError::MissingVar("OPENAI_API_KEY".into()));
        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let validation = ApiError::Validation("No messages provided".into());
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let upstream = ApiError::Upstream("Failed to create session: timeout".into());
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_detail_text() {
        let config = ApiError::Configuration(ConfigError::MissingVar("OPENAI_API_KEY".into()));
        assert_eq!(
            config.to_string(),
            "Missing environment variable: OPENAI_API_KEY"
        );

        let upstream = ApiError::Upstream("Failed to create session: boom".into());
        assert_eq!(upstream.to_string(), "Failed to create session: boom");
    }

    #[test]
    fn test_api_error_into_response_status() {
        let response = ApiError::Validation("No messages provided".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_root_and_health_bodies() {
        let Json(root) = root().await;
        assert_eq!(root.message, "Healthcare Chat API is running");

        let Json(health) = health_check().await;
        assert_eq!(health.status, "healthy");
    }
}
