use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::DiagramRequest;
use crate::error::ApiError;
use crate::services::{DiagramStore, RenderService};

/// Response from the /save endpoint
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub message: String,
    /// Path of the stored diagram source
    pub puml_path: String,
    /// Path of the stored PNG image
    pub png_path: String,
}

/// Render a diagram and keep source and image in the save directory
///
/// Each call creates a new `diagram_<id>.puml` / `diagram_<id>.png` pair.
/// Existing records are never overwritten.
#[utoipa::path(
    post,
    path = "/save",
    request_body = DiagramRequest,
    responses(
        (status = 200, description = "Diagram saved", body = SaveResponse),
        (status = 400, description = "Empty diagram text"),
        (status = 500, description = "Rendering failed, nothing was saved"),
    ),
    tag = "Diagrams"
)]
pub async fn handle_save(
    State(renderer): State<Arc<RenderService>>,
    State(store): State<Arc<DiagramStore>>,
    Json(request): Json<DiagramRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let text = request.text()?;

    let record = store.save(&renderer, text).await.map_err(|e| {
        tracing::error!(kind = e.kind(), error = %e, "Save request failed");
        e
    })?;

    Ok(Json(SaveResponse {
        message: "Saved successfully".to_string(),
        puml_path: record.source.display().to_string(),
        png_path: record.image.display().to_string(),
    }))
}
