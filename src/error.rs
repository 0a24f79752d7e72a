use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No UML text provided")]
    EmptyInput,

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to start renderer '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. The captured stderr is kept for logging but is not part
    /// of the message shown to callers.
    #[error("Renderer exited with code {}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ToolFailure { code: Option<i32>, stderr: String },

    /// Exit zero but no image. The expected path is logged, not shown to callers.
    #[error("Renderer produced no output")]
    OutputMissing { path: PathBuf },

    #[error("Renderer timed out after {}s", .after.as_secs_f32())]
    Timeout { after: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Short machine-friendly name of the failure kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Spawn { .. } => "spawn_failure",
            RenderError::ToolFailure { .. } => "tool_failure",
            RenderError::OutputMissing { .. } => "output_missing",
            RenderError::Timeout { .. } => "timeout",
            RenderError::Io(_) => "io",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::EmptyInput => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Render(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": message,
        }));

        (status, body).into_response()
    }
}
