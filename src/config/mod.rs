//! Configuration module
//!
//! Loads, validates, and hashes the TOML configuration document that
//! describes the harvest: global pacing and restart policy, the source
//! endpoints, egress identities, extraction selectors, and the section list.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    Config, EgressConfig, ExtractorConfig, HarvestConfig, OutputConfig, SectionConfig,
    SourceConfig,
};
pub use validation::validate;
