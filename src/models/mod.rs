pub mod config;
pub mod diagram;

pub use config::{AppConfig, RendererConfig};
pub use diagram::{DiagramFiles, DiagramId, DiagramIdGenerator};
