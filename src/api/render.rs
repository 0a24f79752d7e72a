use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::DiagramRequest;
use crate::error::ApiError;
use crate::models::diagram::IMAGE_MIME;
use crate::services::RenderService;

/// Render a diagram to PNG
///
/// The source is rendered in a private scratch directory, so concurrent
/// requests never see each other's output. Nothing is kept after the response.
#[utoipa::path(
    post,
    path = "/render",
    request_body = DiagramRequest,
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 400, description = "Empty diagram text"),
        (status = 500, description = "Renderer failed, could not be started, timed out or wrote no image"),
    ),
    tag = "Diagrams"
)]
pub async fn handle_render(
    State(renderer): State<Arc<RenderService>>,
    Json(request): Json<DiagramRequest>,
) -> Result<Response, ApiError> {
    let text = request.text()?;

    let png_bytes = renderer.render(text).await.map_err(|e| {
        tracing::error!(kind = e.kind(), error = %e, "Render request failed");
        e
    })?;

    tracing::info!(size_bytes = png_bytes.len(), "Diagram rendered");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, IMAGE_MIME),
            (header::CONTENT_LENGTH, &png_bytes.len().to_string()),
        ],
        Bytes::from(png_bytes),
    )
        .into_response())
}
