//! Readiness markers
//!
//! Workers are separate OS processes, so the bootstrap-complete handshake
//! rides on a durable, section-keyed marker file rather than an in-process
//! channel. Semantics are at-least-once and poll-based: the worker may
//! signal again after a restart, and the orchestrator removes the marker
//! once observed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Section-keyed readiness signal, created by a worker once its session
/// bootstrap completes and consumed by the orchestrator
#[derive(Debug, Clone)]
pub struct ReadinessMarker {
    path: PathBuf,
}

impl ReadinessMarker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the marker. Idempotent; repeated signals overwrite.
    pub fn signal(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, chrono::Utc::now().to_rfc3339())
    }

    /// True once a signal has been written and not yet consumed
    pub fn is_signaled(&self) -> bool {
        self.path.exists()
    }

    /// Removes the marker; missing markers are fine (consume-once races)
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_signal_and_clear() {
        let dir = tempdir().unwrap();
        let marker = ReadinessMarker::new(dir.path().join("bmw.ready"));

        assert!(!marker.is_signaled());

        marker.signal().unwrap();
        assert!(marker.is_signaled());

        marker.clear().unwrap();
        assert!(!marker.is_signaled());
    }

    #[test]
    fn test_signal_is_idempotent() {
        let dir = tempdir().unwrap();
        let marker = ReadinessMarker::new(dir.path().join("bmw.ready"));

        marker.signal().unwrap();
        marker.signal().unwrap();
        assert!(marker.is_signaled());
    }

    #[test]
    fn test_clear_missing_marker_is_ok() {
        let dir = tempdir().unwrap();
        let marker = ReadinessMarker::new(dir.path().join("bmw.ready"));
        assert!(marker.clear().is_ok());
    }

    #[test]
    fn test_signal_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let marker = ReadinessMarker::new(dir.path().join("nested/deeper/bmw.ready"));
        marker.signal().unwrap();
        assert!(marker.is_signaled());
    }
}
