//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application, the
//! cross-origin policy, and the OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ChatCompletionPayload, ErrorResponse, HealthResponse, RootResponse, SessionResponse,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::health_check,
        handlers::create_session,
        handlers::chat_completions,
        handlers::get_agent_config,
    ),
    components(
        schemas(RootResponse, HealthResponse, SessionResponse, ChatCompletionPayload, ErrorResponse)
    ),
    tags(
        (name = "Healthcare Chat API", description = "Realtime sessions and chat completions for the appointment assistant")
    )
)]
pub struct ApiDoc;

/// Permits every origin, method and header.
///
/// Not suitable for production; restrict the origins before deploying.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api/session/create", post(handlers::create_session))
        .route("/api/chat/completions", post(handlers::chat_completions))
        .route("/api/agent/config", get(handlers::get_agent_config))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
        .layer(permissive_cors())
}
