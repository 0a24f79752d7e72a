//! Persistent storage of saved diagrams.
//!
//! A saved record is a `diagram_<id>.puml` / `diagram_<id>.png` pair in a flat
//! directory. Records are only ever created: the source file is claimed with
//! an exclusive create, so an id already on disk is skipped rather than
//! overwritten. Records still being rendered are left out of listings.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::RenderError;
use crate::models::diagram::{rendered_image_path, SOURCE_EXTENSION};
use crate::models::{DiagramFiles, DiagramId, DiagramIdGenerator};
use crate::services::RenderService;

/// Give up claiming an id after this many existing files in a row
const MAX_CLAIM_ATTEMPTS: usize = 64;

/// Paths of a saved diagram record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDiagram {
    pub id: DiagramId,
    pub source: PathBuf,
    pub image: PathBuf,
}

/// Flat-file store of saved diagram pairs
pub struct DiagramStore {
    dir: PathBuf,
    ids: DiagramIdGenerator,
    pending: Mutex<HashSet<DiagramId>>,
}

impl DiagramStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ids: DiagramIdGenerator::new(),
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the save directory if it does not exist yet
    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// Paths a record with `id` has in this store
    pub fn record(&self, id: DiagramId) -> SavedDiagram {
        SavedDiagram {
            id,
            source: self.dir.join(id.source_file_name()),
            image: self.dir.join(id.image_file_name()),
        }
    }

    /// Render `text` and persist it as a new record.
    ///
    /// On failure the claimed source file and any partial image are removed,
    /// so the directory only ever holds complete pairs.
    pub async fn save(
        &self,
        renderer: &RenderService,
        text: &str,
    ) -> Result<SavedDiagram, RenderError> {
        let (record, _pending) = self.claim().await?;
        let files = DiagramFiles::for_source(&record.source);

        let result = match renderer.invoke(text, &files).await {
            Ok(_) => self.relocate_output(&files, &record).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    id = %record.id,
                    source = %record.source.display(),
                    image = %record.image.display(),
                    "Diagram saved"
                );
                Ok(record)
            }
            Err(e) => {
                self.discard(&files, &record).await;
                Err(e)
            }
        }
    }

    /// Reserve a fresh id by exclusively creating its source file.
    ///
    /// The id counts as pending until the returned guard is dropped.
    async fn claim(&self) -> io::Result<(SavedDiagram, PendingSave<'_>)> {
        tokio::fs::create_dir_all(&self.dir).await?;

        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let record = self.record(self.ids.next_id());
            let pending = self.mark_pending(record.id);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&record.source)
                .await
            {
                Ok(_) => return Ok((record, pending)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(id = %record.id, "Diagram id already taken, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free diagram id after {MAX_CLAIM_ATTEMPTS} attempts"),
        ))
    }

    fn mark_pending(&self, id: DiagramId) -> PendingSave<'_> {
        self.pending_ids().insert(id);
        PendingSave { store: self, id }
    }

    fn is_pending(&self, id: DiagramId) -> bool {
        self.pending_ids().contains(&id)
    }

    fn pending_ids(&self) -> MutexGuard<'_, HashSet<DiagramId>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the renderer's output to the record's image path if they differ
    async fn relocate_output(
        &self,
        files: &DiagramFiles,
        record: &SavedDiagram,
    ) -> Result<(), RenderError> {
        if files.image != record.image {
            tokio::fs::rename(&files.image, &record.image).await?;
        }
        Ok(())
    }

    async fn discard(&self, files: &DiagramFiles, record: &SavedDiagram) {
        for path in [&record.source, &files.image, &record.image] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed file of failed save"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(%e, path = %path.display(), "Failed to clean up after failed save"),
            }
        }
    }

    /// List saved records, newest first. Saves still in progress are skipped.
    pub async fn list(&self) -> io::Result<Vec<SavedEntry>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut saved = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
                continue;
            }
            let Some(id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(DiagramId::from_file_name)
            else {
                continue;
            };
            if self.is_pending(id) {
                continue;
            }

            let has_image = tokio::fs::try_exists(rendered_image_path(&path))
                .await
                .unwrap_or(false);
            saved.push(SavedEntry {
                record: self.record(id),
                has_image,
            });
        }

        saved.sort_by(|a, b| b.record.id.cmp(&a.record.id));
        Ok(saved)
    }
}

/// Removes an id from the pending set when the save finishes or is cancelled
struct PendingSave<'a> {
    store: &'a DiagramStore,
    id: DiagramId,
}

impl Drop for PendingSave<'_> {
    fn drop(&mut self) {
        self.store.pending_ids().remove(&self.id);
    }
}

/// A record found on disk by [`DiagramStore::list`]
#[derive(Debug, Clone)]
pub struct SavedEntry {
    pub record: SavedDiagram,
    pub has_image: bool,
}
