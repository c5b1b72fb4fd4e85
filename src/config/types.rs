use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure for pagetide
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub harvest: HarvestConfig,
    pub source: SourceConfig,
    /// Optional shared egress proxy; when absent, workers connect directly.
    #[serde(default)]
    pub egress: Option<EgressConfig>,
    pub extractor: ExtractorConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionConfig>,
}

/// Harvest behavior configuration: pacing, restart policy, block markers
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Items requested per page unless a section overrides it
    #[serde(rename = "default-page-size")]
    pub default_page_size: u32,

    /// Lower bound of the randomized inter-page pause (milliseconds)
    #[serde(rename = "pacing-min-ms", default = "default_pacing_min_ms")]
    pub pacing_min_ms: u64,

    /// Upper bound of the randomized inter-page pause (milliseconds)
    #[serde(rename = "pacing-max-ms", default = "default_pacing_max_ms")]
    pub pacing_max_ms: u64,

    /// Maximum full-session restart attempts before a section is abandoned
    #[serde(rename = "max-restart-attempts", default = "default_max_restart_attempts")]
    pub max_restart_attempts: u32,

    /// Fixed pause before each restart attempt (seconds)
    #[serde(rename = "restart-backoff-secs", default = "default_restart_backoff_secs")]
    pub restart_backoff_secs: u64,

    /// Pause between starting consecutive section workers (seconds)
    #[serde(rename = "startup-cooldown-secs", default = "default_startup_cooldown_secs")]
    pub startup_cooldown_secs: u64,

    /// Substrings that mark a payload as an anti-automation challenge,
    /// matched case-insensitively
    #[serde(rename = "block-markers", default = "default_block_markers")]
    pub block_markers: Vec<String>,
}

/// Listing source endpoints and bootstrap behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Origin of the listing site, e.g. "https://listings.example.com"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the keyword search endpoint, relative to base-url
    #[serde(rename = "search-path", default = "default_search_path")]
    pub search_path: String,

    /// CSS selector that must match before the search page counts as loaded
    #[serde(rename = "ready-selector")]
    pub ready_selector: String,

    /// CSS selector of the element holding the total result count
    #[serde(rename = "total-selector")]
    pub total_selector: String,

    /// Overall deadline for session bootstrap (seconds)
    #[serde(rename = "bootstrap-timeout-secs", default = "default_bootstrap_timeout_secs")]
    pub bootstrap_timeout_secs: u64,

    /// Interval between bootstrap readiness polls (milliseconds)
    #[serde(rename = "bootstrap-poll-ms", default = "default_bootstrap_poll_ms")]
    pub bootstrap_poll_ms: u64,
}

/// Shared egress proxy endpoint; the port rotates per section
#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    pub host: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Selectors driving the default item extractor
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Selector matching one listing card per item
    #[serde(rename = "card-selector")]
    pub card_selector: String,

    /// Selector, relative to the card, of the anchor carrying title and link
    #[serde(rename = "link-selector", default = "default_link_selector")]
    pub link_selector: String,

    /// Extra fields to pull from each card: field name -> CSS selector
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding per-section checkpoint documents
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Directory holding per-section log files
    #[serde(rename = "log-dir")]
    pub log_dir: String,
}

/// One independent crawl target
#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    /// Search keyword; also keys the checkpoint, log file, and readiness marker
    pub keyword: String,

    /// Egress proxy port dedicated to this section
    #[serde(rename = "proxy-port", default)]
    pub proxy_port: Option<u16>,

    /// Per-section page size override
    #[serde(rename = "page-size", default)]
    pub page_size: Option<u32>,
}

impl Config {
    /// Effective page size for a section (override or global default)
    pub fn page_size_for(&self, section: &SectionConfig) -> u32 {
        section.page_size.unwrap_or(self.harvest.default_page_size)
    }

    /// Path of a section's checkpoint document
    pub fn checkpoint_path(&self, keyword: &str) -> PathBuf {
        Path::new(&self.output.data_dir).join(format!("{}_items.json", keyword))
    }

    /// Path of a section's readiness marker
    pub fn readiness_path(&self, keyword: &str) -> PathBuf {
        Path::new(&self.output.data_dir).join(format!("{}.ready", keyword))
    }

    /// Path of a section's durable log file
    pub fn log_path(&self, keyword: &str) -> PathBuf {
        Path::new(&self.output.log_dir).join(format!("{}.log", keyword))
    }

    /// Looks up a section by keyword
    pub fn find_section(&self, keyword: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.keyword == keyword)
    }
}

fn default_pacing_min_ms() -> u64 {
    2_000
}

fn default_pacing_max_ms() -> u64 {
    5_000
}

fn default_max_restart_attempts() -> u32 {
    5
}

fn default_restart_backoff_secs() -> u64 {
    5
}

fn default_startup_cooldown_secs() -> u64 {
    60
}

fn default_block_markers() -> Vec<String> {
    vec!["captcha".to_string(), "incapsula".to_string()]
}

fn default_search_path() -> String {
    "/Search".to_string()
}

fn default_bootstrap_timeout_secs() -> u64 {
    120
}

fn default_bootstrap_poll_ms() -> u64 {
    2_000
}

fn default_link_selector() -> String {
    "a".to_string()
}
