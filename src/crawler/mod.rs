//! Crawl core for one section
//!
//! This module contains the fetch-and-checkpoint loop and the machinery
//! around it:
//! - Page fetching with egress rotation and bounded timeouts
//! - Block-signature detection
//! - The section state machine
//! - The bounded restart supervisor

mod block;
mod fetcher;
mod section;
mod supervisor;

pub use block::{BlockDetector, MarkerBlockList};
pub use fetcher::PageFetcher;
pub use section::{CrawlState, SectionCrawler};
pub use supervisor::{FailureClass, RestartSupervisor, SectionOutcome};
