use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::services::DiagramStore;

/// A saved diagram record
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedDiagramInfo {
    /// Identity token shared by both files
    pub id: i64,
    pub puml_path: String,
    pub png_path: String,
    /// False if the image file has been removed externally
    pub has_image: bool,
}

/// List saved diagrams, newest first
#[utoipa::path(
    get,
    path = "/api/diagrams",
    responses(
        (status = 200, description = "Saved diagrams", body = [SavedDiagramInfo]),
        (status = 500, description = "Save directory could not be read"),
    ),
    tag = "Diagrams"
)]
pub async fn handle_list_diagrams(
    State(store): State<Arc<DiagramStore>>,
) -> Result<Json<Vec<SavedDiagramInfo>>, ApiError> {
    let entries = store.list().await.map_err(|e| {
        tracing::error!(%e, dir = %store.dir().display(), "Failed to list saved diagrams");
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| SavedDiagramInfo {
                id: entry.record.id.value(),
                puml_path: entry.record.source.display().to_string(),
                png_path: entry.record.image.display().to_string(),
                has_image: entry.has_image,
            })
            .collect(),
    ))
}
