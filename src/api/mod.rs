pub mod diagrams;
pub mod render;
pub mod save;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ApiError;

pub use diagrams::{handle_list_diagrams, SavedDiagramInfo, __path_handle_list_diagrams};
pub use render::{handle_render, __path_handle_render};
pub use save::{handle_save, SaveResponse, __path_handle_save};

/// Request body shared by `/render` and `/save`
#[derive(Debug, Deserialize, ToSchema)]
pub struct DiagramRequest {
    /// PlantUML diagram source
    #[serde(alias = "diagramText")]
    pub uml: String,
}

impl DiagramRequest {
    /// The trimmed diagram text, or `EmptyInput` if nothing is left
    pub fn text(&self) -> Result<&str, ApiError> {
        let text = self.uml.trim();
        if text.is_empty() {
            return Err(ApiError::EmptyInput);
        }
        Ok(text)
    }
}
