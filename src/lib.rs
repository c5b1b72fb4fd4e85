//! Pagetide: a resilient harvester for paginated listing sites
//!
//! This crate crawls keyword "sections" of a rate-limiting, anti-automation
//! protected listing source. Each section runs in its own worker process,
//! bootstraps an authenticated session, walks the paginated results in
//! order, and persists every page into a durable whole-document checkpoint
//! so that a crash or block never loses more than one page of work.

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod logging;
pub mod orchestrator;
pub mod session;

use thiserror::Error;

/// Main error type for pagetide operations
///
/// The first five variants form the failure taxonomy the restart supervisor
/// classifies; the rest are ambient errors surfaced during setup.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Network or protocol failure while fetching a page. Recoverable.
    #[error("Transport failure on page {page}: {message}")]
    Transport { page: u32, message: String },

    /// A block signature was found in the payload. Recoverable, but always
    /// forces a full session restart rather than a same-session page retry.
    #[error("Block signature '{marker}' detected on page {page}")]
    Block { page: u32, marker: String },

    /// The session could not be established. Recoverable.
    #[error("Session bootstrap failed for '{keyword}': {message}")]
    Bootstrap { keyword: String, message: String },

    /// The egress credentials were rejected. Fatal, zero retries.
    #[error("Egress credentials rejected: {0}")]
    Auth(String),

    /// The restart budget was exhausted. Fatal for the section.
    #[error("Retry budget exhausted for '{keyword}' after {attempts} attempts")]
    RetryBudgetExceeded { keyword: String, attempts: u32 },

    /// Item extraction failed on an otherwise healthy payload.
    #[error("Extraction failed on page {page}: {message}")]
    Extract { page: u32, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for pagetide operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checkpoint::CheckpointFile;
pub use config::Config;
pub use crawler::{FailureClass, RestartSupervisor, SectionCrawler, SectionOutcome};
pub use extract::{Item, ItemExtractor};
pub use session::{BootstrapOutcome, Session, SessionBootstrap};
