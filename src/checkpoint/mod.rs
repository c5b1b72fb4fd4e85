//! Durable whole-document checkpoint store
//!
//! A checkpoint is the ordered JSON array of every item a section has
//! collected so far. It is the single source of truth for resume position:
//! after every successful page the full document is rewritten atomically
//! (write to a temporary file in the same directory, then rename over the
//! live document), so external readers never observe a torn write and a
//! crash can lose at most the page that was in flight.

use crate::extract::Item;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Checkpoint persistence errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Failed to replace checkpoint document: {0}")]
    Replace(String),
}

/// A section's checkpoint document, mirrored in memory
#[derive(Debug)]
pub struct CheckpointFile {
    path: PathBuf,
    items: Vec<Item>,
}

impl CheckpointFile {
    /// Opens a checkpoint, reading any existing document
    ///
    /// A missing file yields an empty checkpoint; a present file must be a
    /// valid JSON array (the atomic replace guarantees this for our own
    /// writes, so a parse failure means external corruption and is an error
    /// rather than a silent restart from zero).
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let items = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    /// Number of items committed so far
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing has been committed yet
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Path of the on-disk document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First page that still needs fetching: `len / page_size + 1`
    ///
    /// Derived purely from committed length, so it is identical whether the
    /// previous attempt exited cleanly or crashed mid-page.
    pub fn resume_page(&self, page_size: u32) -> u32 {
        debug_assert!(page_size > 0);
        (self.items.len() as u32) / page_size + 1
    }

    /// Appends one page's items and rewrites the whole document
    ///
    /// The write is synchronous: when this returns, the new document is the
    /// live one. Item order within and across pages is preserved.
    pub fn append_page(&mut self, items: Vec<Item>) -> Result<(), CheckpointError> {
        self.items.extend(items);
        self.persist()
    }

    fn persist(&self) -> Result<(), CheckpointError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        // Temp file must live in the target directory so the final rename
        // stays on one filesystem and is atomic.
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.items)?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| CheckpointError::Replace(e.to_string()))?;

        Ok(())
    }
}
