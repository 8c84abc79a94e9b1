// src/handlers.rs

use axum::{Json, extract::State};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;
use crate::error::{AppError, Result};
use crate::models::{AskRequest, AskResponse, HealthStatus, WelcomeResponse};

// ============================================================================
// Router Setup
// ============================================================================

pub fn create_router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(root))
        .route("/ask", axum::routing::post(ask_handler))
        .route("/health", axum::routing::get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for answering one medical question
///
/// POST /ask
/// Body: {"query": "..."}
///
/// Returns: the synthesized answer plus a report per consulted source
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    if !request.is_valid() {
        return Err(AppError::validation("Query must not be empty")
            .with_details(serde_json::json!({ "field": "query" })));
    }

    let assistance = state.assistant.answer(request.query.trim()).await?;

    Ok(Json(AskResponse {
        answer: assistance.answer,
        sources: assistance.sources,
    }))
}

/// GET / - welcome message, also handy as a liveness check
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse::new())
}

/// GET /health
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}
