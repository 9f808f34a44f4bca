//! Filesystem layout for item artifacts
//!
//! ```text
//! {root}/{id}/{id}.txt   magnet link followed by CRLF
//! {root}/{id}/{id}.jpg   cover image
//! ```

use crate::storage::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Line terminator written after the magnet link
pub const RECORD_TERMINATOR: &str = "\r\n";

/// Writes magnet records and covers below an output root
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn item_dir(&self, item_id: &str) -> PathBuf {
        self.root.join(item_id)
    }

    pub fn record_path(&self, item_id: &str) -> PathBuf {
        self.item_dir(item_id).join(format!("{}.txt", item_id))
    }

    pub fn cover_path(&self, item_id: &str, extension: &str) -> PathBuf {
        self.item_dir(item_id)
            .join(format!("{}.{}", item_id, extension))
    }

    /// Creates the item directory; an existing directory is fine
    pub async fn ensure_item_dir(&self, item_id: &str) -> StorageResult<PathBuf> {
        let dir = self.item_dir(item_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Write {
                path: dir.clone(),
                source,
            })?;
        Ok(dir)
    }

    /// Writes the magnet record for an item, replacing any previous one
    ///
    /// # Returns
    ///
    /// The path of the written record
    pub async fn write_magnet(&self, item_id: &str, magnet: &str) -> StorageResult<PathBuf> {
        self.ensure_item_dir(item_id).await?;
        let path = self.record_path(item_id);
        let record = format!("{}{}", magnet, RECORD_TERMINATOR);

        tokio::fs::write(&path, record)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    /// Reads back the raw magnet record of an item
    pub async fn read_magnet(&self, item_id: &str) -> StorageResult<String> {
        let path = self.record_path(item_id);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StorageError::Read { path, source })
    }

    /// Creates (or truncates) the cover file for an item
    pub async fn create_cover(
        &self,
        item_id: &str,
        extension: &str,
    ) -> StorageResult<(PathBuf, tokio::fs::File)> {
        self.ensure_item_dir(item_id).await?;
        let path = self.cover_path(item_id, extension);
        let file = tokio::fs::File::create(&path)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;
        Ok((path, file))
    }

    /// Appends a chunk to an open cover file
    pub async fn write_chunk(
        file: &mut tokio::fs::File,
        path: &Path,
        chunk: &[u8],
    ) -> StorageResult<()> {
        file.write_all(chunk)
            .await
            .map_err(|source| StorageError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Removes a partially written file, ignoring a missing one
    pub async fn discard(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}
