//! HTTP API
//!
//! `POST /generate_story_audio` validates the body, runs one orchestration and
//! returns `{story, audio_url, image_url}`. Generated narration and any bundled
//! front-end are served from the static directory.

use crate::config::StorytellerConfig;
use crate::error::ApiError;
use crate::orchestrator::StoryOrchestrator;
use crate::story::{StoryRequest, StoryRequestBody, StoryResponse};
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

pub const WELCOME_MESSAGE: &str =
    "Welcome to AI Story Teller! Access frontend at /static/index.html";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<StoryOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<StoryOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Build the application router.
pub fn create_router(state: AppState, static_dir: &Path, public_prefix: &str) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/generate_story_audio", post(generate_story_audio))
        .nest_service(
            public_prefix.trim_end_matches('/'),
            ServeDir::new(static_dir),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn home() -> impl IntoResponse {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

#[instrument(skip_all, fields(language = %body.language))]
async fn generate_story_audio(
    State(state): State<AppState>,
    Json(body): Json<StoryRequestBody>,
) -> Result<Json<StoryResponse>, ApiError> {
    let request = StoryRequest::try_from(body).map_err(|e| {
        warn!(error = %e, "Rejected story request");
        e
    })?;

    let result = state.orchestrator.orchestrate(&request).await.map_err(|e| {
        error!(error = %e, "Error generating story/audio/image");
        e
    })?;

    Ok(Json(StoryResponse::from(result)))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run(config: &StorytellerConfig) -> anyhow::Result<()> {
    let addr = config.server.bind_addr()?;
    tokio::fs::create_dir_all(&config.server.static_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create static directory {}",
                config.server.static_dir.display()
            )
        })?;

    let orchestrator = StoryOrchestrator::from_config(config)?;
    let state = AppState::new(Arc::new(orchestrator));
    let router = create_router(
        state,
        &config.server.static_dir,
        &config.server.public_prefix,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        address = %addr,
        static_dir = %config.server.static_dir.display(),
        "Server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
