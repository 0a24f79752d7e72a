//! umlserve - PlantUML rendering service
//!
//! HTTP wrapper around an external diagram renderer, with flat-file storage
//! of saved diagrams. This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
