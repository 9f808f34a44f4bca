//! Storage module for persisting item artifacts
//!
//! Each resolved item gets its own directory under the output root holding
//! the magnet record and the cover image. Nothing is ever read back during a
//! crawl; there is no index or database.

mod artifacts;

pub use artifacts::{ArtifactStore, RECORD_TERMINATOR};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
