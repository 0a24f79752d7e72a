//! Per-request scratch directories for the `/render` endpoint.
//!
//! Every render gets its own directory, so concurrent requests never share a
//! source or image file. [`ScratchFiles::close`] removes the directory off the
//! async runtime; if a request is cancelled first, dropping the value removes
//! it instead.

use std::io;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::models::diagram::{DiagramFiles, SOURCE_EXTENSION};

/// Name of the source file inside a scratch directory
const SCRATCH_STEM: &str = "diagram";

/// Allocates scratch directories below a root directory
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Allocate a fresh, empty directory for one render
    pub async fn allocate(&self) -> io::Result<ScratchFiles> {
        tokio::fs::create_dir_all(&self.root).await?;

        let root = self.root.clone();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("umlserve-render-")
                .tempdir_in(root)
        })
        .await
        .map_err(io::Error::other)??;
        let source = dir.path().join(format!("{SCRATCH_STEM}.{SOURCE_EXTENSION}"));

        Ok(ScratchFiles {
            files: DiagramFiles::for_source(source),
            dir,
        })
    }
}

/// Source and image paths inside a scratch directory that lives as long as
/// this value
#[derive(Debug)]
pub struct ScratchFiles {
    files: DiagramFiles,
    dir: TempDir,
}

impl ScratchFiles {
    pub fn files(&self) -> &DiagramFiles {
        &self.files
    }

    /// Remove the directory and everything in it
    pub async fn close(self) -> io::Result<()> {
        let dir = self.dir;
        tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(io::Error::other)?
    }
}
