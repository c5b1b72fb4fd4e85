//! Supervised worker registry
//!
//! Tracks the worker process of every section through explicit states and
//! operations instead of a bare shared handle. The registry owns the child
//! handles; callers observe lightweight statuses.

use std::collections::HashMap;
use std::io;
use std::process::ExitStatus;
use tokio::process::Child;

/// Observable status of a section's worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// No worker has been registered for this section
    Absent,

    /// Worker process is running
    Running,

    /// Worker process has exited
    Stopped(Option<i32>),
}

enum WorkerState {
    Running(Child),
    Stopped(ExitStatus),
}

/// Registry of section workers keyed by keyword
#[derive(Default)]
pub struct WorkerRegistry {
    workers: HashMap<String, WorkerState>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly spawned worker
    ///
    /// Refuses to replace a running worker; a section has at most one
    /// active process.
    pub fn register(&mut self, keyword: &str, child: Child) -> io::Result<()> {
        if matches!(self.workers.get(keyword), Some(WorkerState::Running(_))) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("worker for '{}' is already running", keyword),
            ));
        }

        self.workers
            .insert(keyword.to_string(), WorkerState::Running(child));
        Ok(())
    }

    /// Current status without blocking
    pub fn status(&self, keyword: &str) -> WorkerStatus {
        match self.workers.get(keyword) {
            None => WorkerStatus::Absent,
            Some(WorkerState::Running(_)) => WorkerStatus::Running,
            Some(WorkerState::Stopped(status)) => WorkerStatus::Stopped(status.code()),
        }
    }

    /// Polls a worker for exit; transitions to `Stopped` when it has
    pub fn try_finish(&mut self, keyword: &str) -> io::Result<Option<ExitStatus>> {
        let polled = match self.workers.get_mut(keyword) {
            None => return Ok(None),
            Some(WorkerState::Stopped(status)) => return Ok(Some(*status)),
            Some(WorkerState::Running(child)) => child.try_wait()?,
        };

        if let Some(status) = polled {
            self.workers
                .insert(keyword.to_string(), WorkerState::Stopped(status));
        }
        Ok(polled)
    }

    /// Waits for a worker to exit and returns its status
    pub async fn wait(&mut self, keyword: &str) -> io::Result<ExitStatus> {
        let status = match self.workers.get_mut(keyword) {
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no worker registered for '{}'", keyword),
                ))
            }
            Some(WorkerState::Stopped(status)) => return Ok(*status),
            Some(WorkerState::Running(child)) => child.wait().await?,
        };

        self.workers
            .insert(keyword.to_string(), WorkerState::Stopped(status));
        Ok(status)
    }
}
