//! Restart supervisor
//!
//! Wraps the section crawler with the bounded restart policy: every
//! recoverable failure discards the session, waits a fixed backoff, and
//! re-runs the whole attempt from a fresh bootstrap. The resume page is
//! recomputed from the on-disk checkpoint at the start of every attempt,
//! never from in-memory progress, so the policy is identical after a clean
//! failure and after a process crash.

use crate::checkpoint::CheckpointFile;
use crate::config::{Config, SectionConfig};
use crate::crawler::block::BlockDetector;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::section::SectionCrawler;
use crate::extract::ItemExtractor;
use crate::orchestrator::ReadinessMarker;
use crate::session::SessionBootstrap;
use crate::HarvestError;
use std::path::PathBuf;
use std::time::Duration;

/// How a terminal failure should be handled
///
/// Classification happens exactly once per failure; the supervisor
/// dispatches on the result and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Abort the section immediately, zero retries
    Fatal,

    /// Re-run the full attempt with a fresh session
    RecoverableSession,

    /// Page-scoped hiccup; sessions are attempt-scoped, so recovery still
    /// re-enters through a fresh bootstrap
    RecoverablePage,
}

impl FailureClass {
    pub fn classify(error: &HarvestError) -> Self {
        match error {
            HarvestError::Auth(_)
            | HarvestError::RetryBudgetExceeded { .. }
            | HarvestError::Config(_) => Self::Fatal,

            HarvestError::Extract { .. } => Self::RecoverablePage,

            HarvestError::Transport { .. }
            | HarvestError::Block { .. }
            | HarvestError::Bootstrap { .. }
            | HarvestError::Checkpoint(_)
            | HarvestError::Reqwest(_)
            | HarvestError::UrlParse(_)
            | HarvestError::Io(_) => Self::RecoverableSession,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Result of a section that reached `Done`
#[derive(Debug, Clone)]
pub struct SectionOutcome {
    pub keyword: String,
    pub checkpoint_path: PathBuf,
    pub items: usize,
    pub total_pages: u32,
}

/// Supervises one section to completion or abandonment
pub struct RestartSupervisor<'a, B: SessionBootstrap> {
    config: &'a Config,
    section: &'a SectionConfig,
    bootstrap: &'a B,
    extractor: &'a dyn ItemExtractor,
    detector: &'a dyn BlockDetector,
    marker: Option<&'a ReadinessMarker>,
}

impl<'a, B: SessionBootstrap> RestartSupervisor<'a, B> {
    pub fn new(
        config: &'a Config,
        section: &'a SectionConfig,
        bootstrap: &'a B,
        extractor: &'a dyn ItemExtractor,
        detector: &'a dyn BlockDetector,
        marker: Option<&'a ReadinessMarker>,
    ) -> Self {
        Self {
            config,
            section,
            bootstrap,
            extractor,
            detector,
            marker,
        }
    }

    /// Runs attempts until `Done`, a fatal failure, or budget exhaustion
    pub async fn run(&self) -> Result<SectionOutcome, HarvestError> {
        let keyword = &self.section.keyword;
        let max_attempts = self.config.harvest.max_restart_attempts;
        let backoff = Duration::from_secs(self.config.harvest.restart_backoff_secs);
        let mut attempts = 0u32;

        loop {
            match self.attempt().await {
                Ok(outcome) => {
                    tracing::info!(
                        %keyword,
                        items = outcome.items,
                        total_pages = outcome.total_pages,
                        "section done"
                    );
                    return Ok(outcome);
                }
                Err(error) => {
                    let class = FailureClass::classify(&error);
                    if class.is_fatal() {
                        tracing::error!(%keyword, error = %error, "fatal failure, abandoning section");
                        return Err(error);
                    }

                    attempts += 1;
                    tracing::warn!(
                        %keyword,
                        attempt = attempts,
                        max_attempts,
                        class = ?class,
                        error = %error,
                        "attempt failed"
                    );

                    if attempts >= max_attempts {
                        tracing::error!(%keyword, attempts, "retry budget exhausted, abandoning section");
                        return Err(HarvestError::RetryBudgetExceeded {
                            keyword: keyword.clone(),
                            attempts,
                        });
                    }

                    tracing::info!(%keyword, backoff_secs = backoff.as_secs(), "restarting after backoff");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// One full attempt: resume point from disk, fresh bootstrap, crawl
    async fn attempt(&self) -> Result<SectionOutcome, HarvestError> {
        let page_size = self.config.page_size_for(self.section);
        let checkpoint_path = self.config.checkpoint_path(&self.section.keyword);

        let mut checkpoint = CheckpointFile::load(&checkpoint_path)?;
        let resume_page = checkpoint.resume_page(page_size);

        let outcome = self.bootstrap.acquire(self.section, page_size).await?;

        // Readiness is signaled the moment a bootstrap succeeds, before any
        // paginated fetching; the orchestrator holds the next section on it.
        if let Some(marker) = self.marker {
            marker.signal()?;
        }

        tracing::info!(
            keyword = %self.section.keyword,
            total_pages = outcome.total_pages,
            resume_page,
            committed = checkpoint.len(),
            "session established"
        );

        let fetcher = PageFetcher::new(
            &self.config.source,
            self.config.egress.as_ref(),
            self.section,
            &outcome.session,
            page_size,
        )?;

        let mut crawler = SectionCrawler::new(
            &self.section.keyword,
            fetcher,
            self.extractor,
            self.detector,
            &mut checkpoint,
            outcome.total_pages,
            (
                self.config.harvest.pacing_min_ms,
                self.config.harvest.pacing_max_ms,
            ),
        );

        crawler.run(resume_page).await?;

        Ok(SectionOutcome {
            keyword: self.section.keyword.clone(),
            checkpoint_path,
            items: checkpoint.len(),
            total_pages: outcome.total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert_eq!(
            FailureClass::classify(&HarvestError::Auth("407".to_string())),
            FailureClass::Fatal
        );
        assert_eq!(
            FailureClass::classify(&HarvestError::RetryBudgetExceeded {
                keyword: "bmw".to_string(),
                attempts: 5,
            }),
            FailureClass::Fatal
        );
    }

    #[test]
    fn test_recoverable_session_classification() {
        assert_eq!(
            FailureClass::classify(&HarvestError::Block {
                page: 3,
                marker: "captcha".to_string(),
            }),
            FailureClass::RecoverableSession
        );
        assert_eq!(
            FailureClass::classify(&HarvestError::Bootstrap {
                keyword: "bmw".to_string(),
                message: "timed out".to_string(),
            }),
            FailureClass::RecoverableSession
        );
        assert_eq!(
            FailureClass::classify(&HarvestError::Transport {
                page: 2,
                message: "HTTP 502".to_string(),
            }),
            FailureClass::RecoverableSession
        );
    }

    #[test]
    fn test_recoverable_page_classification() {
        assert_eq!(
            FailureClass::classify(&HarvestError::Extract {
                page: 4,
                message: "selector mismatch".to_string(),
            }),
            FailureClass::RecoverablePage
        );
    }

    // Restart/backoff behavior (budget enforcement, fresh bootstrap per
    // retry, fatal short-circuit) is exercised with scripted bootstrap and
    // mock-server fixtures in tests/harvest_tests.rs.
}
