//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{self, DiagramRequest, SaveResponse, SavedDiagramInfo};
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::{DiagramStore, RenderService, ScratchSpace};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "umlserve API",
        description = "Render PlantUML diagrams to PNG and keep saved copies",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(api::handle_render, api::handle_save, api::handle_list_diagrams),
    components(schemas(DiagramRequest, SaveResponse, SavedDiagramInfo)),
    tags((name = "Diagrams", description = "Diagram rendering and storage"))
)]
pub struct ApiDoc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<RenderService>,
    pub store: Arc<DiagramStore>,
}

/// Create application state from configuration.
///
/// The save directory is created here, so it exists before the first request.
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = DiagramStore::new(&config.save_dir);
    store.ensure_dir().map_err(|e| {
        anyhow::anyhow!(
            "Failed to create save directory {}: {e}",
            config.save_dir.display()
        )
    })?;

    let renderer = RenderService::new(
        config.renderer.clone(),
        ScratchSpace::new(&config.work_dir),
    );

    Ok(AppState {
        renderer: Arc::new(renderer),
        store: Arc::new(store),
    })
}

/// Build the API router with all endpoints and middleware.
///
/// CORS mirrors any origin and allows credentials, methods and headers.
/// Only deploy this way behind a trusted network boundary. The Swagger UI and
/// OpenAPI document sit behind the same layers as the API.
pub fn build_router(state: AppState) -> Router {
    let saved_files = ServeDir::new(state.store.dir());

    Router::new()
        .route("/render", post(handle_render))
        .route("/save", post(handle_save))
        .route("/api/diagrams", get(handle_list_diagrams))
        .nest_service("/diagrams", saved_files)
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_render(
    State(state): State<AppState>,
    request: Json<DiagramRequest>,
) -> Result<Response, ApiError> {
    api::handle_render(State(state.renderer), request).await
}

async fn handle_save(
    State(state): State<AppState>,
    request: Json<DiagramRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    api::handle_save(State(state.renderer), State(state.store), request).await
}

async fn handle_list_diagrams(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedDiagramInfo>>, ApiError> {
    api::handle_list_diagrams(State(state.store)).await
}
