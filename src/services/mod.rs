pub mod diagram_store;
pub mod renderer;
pub mod scratch;

pub use diagram_store::{DiagramStore, SavedDiagram, SavedEntry};
pub use renderer::RenderService;
pub use scratch::{ScratchFiles, ScratchSpace};
