//! Section crawler state machine
//!
//! Drives the fetch -> detect -> extract -> checkpoint loop for one section
//! within one session. Pages advance strictly in order and the checkpoint
//! write for page N is durable before page N+1 is requested, so a terminal
//! failure can always name the last fully committed page.

use crate::checkpoint::CheckpointFile;
use crate::crawler::block::BlockDetector;
use crate::crawler::fetcher::PageFetcher;
use crate::extract::ItemExtractor;
use crate::HarvestError;
use rand::Rng;
use std::time::Duration;

/// Where a section crawl currently stands
///
/// `Blocked` and `Failed` are terminal for the attempt; the supervisor
/// decides whether a fresh attempt follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Created, nothing fetched yet
    Init,

    /// Working on the given page
    Fetching(u32),

    /// Every page up to the bootstrapped total is committed
    Done,

    /// A block signature was detected
    Blocked,

    /// Transport or extraction failure
    Failed,
}

impl CrawlState {
    /// Returns true once the attempt cannot make further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Blocked | Self::Failed)
    }
}

/// One crawl attempt over one section with one session
pub struct SectionCrawler<'a> {
    keyword: &'a str,
    fetcher: PageFetcher,
    extractor: &'a dyn ItemExtractor,
    detector: &'a dyn BlockDetector,
    checkpoint: &'a mut CheckpointFile,
    total_pages: u32,
    pacing_ms: (u64, u64),
    state: CrawlState,
}

impl<'a> SectionCrawler<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        keyword: &'a str,
        fetcher: PageFetcher,
        extractor: &'a dyn ItemExtractor,
        detector: &'a dyn BlockDetector,
        checkpoint: &'a mut CheckpointFile,
        total_pages: u32,
        pacing_ms: (u64, u64),
    ) -> Self {
        Self {
            keyword,
            fetcher,
            extractor,
            detector,
            checkpoint,
            total_pages,
            pacing_ms,
            state: CrawlState::Init,
        }
    }

    /// Current state, mostly for logging and tests
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Runs the loop from `start_page` through the bootstrapped total
    ///
    /// Per successful page: extract, append, persist the whole checkpoint,
    /// then sleep a randomized interval inside the pacing bounds before
    /// advancing. The pacing is what keeps the source's abuse defenses
    /// quiet; skipping it gets the session blocked within a few pages.
    pub async fn run(&mut self, start_page: u32) -> Result<(), HarvestError> {
        if start_page > self.total_pages {
            tracing::info!(
                keyword = self.keyword,
                total_pages = self.total_pages,
                "checkpoint already covers every page"
            );
            self.state = CrawlState::Done;
            return Ok(());
        }

        for page in start_page..=self.total_pages {
            self.state = CrawlState::Fetching(page);
            tracing::info!(
                keyword = self.keyword,
                page,
                total = self.total_pages,
                "fetching page"
            );

            let raw = match self.fetcher.fetch(page).await {
                Ok(raw) => raw,
                Err(e) => {
                    self.state = CrawlState::Failed;
                    return Err(e);
                }
            };

            if let Some(marker) = self.detector.detect(&raw) {
                self.state = CrawlState::Blocked;
                tracing::warn!(
                    keyword = self.keyword,
                    page,
                    marker = %marker,
                    "block signature detected"
                );
                return Err(HarvestError::Block { page, marker });
            }

            let items = match self.extractor.extract(&raw) {
                Ok(items) => items,
                Err(message) => {
                    self.state = CrawlState::Failed;
                    return Err(HarvestError::Extract { page, message });
                }
            };

            let found = items.len();
            self.checkpoint.append_page(items)?;
            tracing::info!(
                keyword = self.keyword,
                page,
                found,
                committed = self.checkpoint.len(),
                "page committed"
            );

            if page < self.total_pages {
                self.pause().await;
            }
        }

        self.state = CrawlState::Done;
        tracing::info!(
            keyword = self.keyword,
            total_pages = self.total_pages,
            items = self.checkpoint.len(),
            "all pages committed"
        );
        Ok(())
    }

    async fn pause(&self) {
        let (min, max) = self.pacing_ms;
        let wait = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        tokio::time::sleep(Duration::from_millis(wait)).await;
    }
}
