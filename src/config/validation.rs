use crate::config::types::{Config, ExtractorConfig, HarvestConfig, SectionConfig, SourceConfig};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_source_config(&config.source)?;
    validate_extractor_config(&config.extractor)?;
    validate_output_config(config)?;
    validate_sections(config)?;
    Ok(())
}

/// Validates pacing, restart policy, and block markers
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.default_page_size < 1 {
        return Err(ConfigError::Validation(
            "default_page_size must be >= 1".to_string(),
        ));
    }

    if config.pacing_min_ms > config.pacing_max_ms {
        return Err(ConfigError::Validation(format!(
            "pacing_min_ms ({}) must not exceed pacing_max_ms ({})",
            config.pacing_min_ms, config.pacing_max_ms
        )));
    }

    if config.max_restart_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_restart_attempts must be >= 1".to_string(),
        ));
    }

    if config.block_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "block_markers must not contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates source endpoints and bootstrap settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must be http(s), got '{}'",
            base.scheme()
        )));
    }

    if !config.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "search_path must start with '/', got '{}'",
            config.search_path
        )));
    }

    validate_selector("ready_selector", &config.ready_selector)?;
    validate_selector("total_selector", &config.total_selector)?;

    if config.bootstrap_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "bootstrap_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.bootstrap_poll_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "bootstrap_poll_ms must be >= 100ms, got {}ms",
            config.bootstrap_poll_ms
        )));
    }

    Ok(())
}

/// Validates extractor selectors
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    validate_selector("card_selector", &config.card_selector)?;
    validate_selector("link_selector", &config.link_selector)?;

    for (name, selector) in &config.fields {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extractor field names must not be empty".to_string(),
            ));
        }
        validate_selector(&format!("fields.{}", name), selector)?;
    }

    Ok(())
}

/// Validates output directories are non-empty paths
fn validate_output_config(config: &Config) -> Result<(), ConfigError> {
    if config.output.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    if config.output.log_dir.is_empty() {
        return Err(ConfigError::Validation(
            "log_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the section list: at least one, unique keywords, sane overrides
fn validate_sections(config: &Config) -> Result<(), ConfigError> {
    if config.sections.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[section]] is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for section in &config.sections {
        validate_section(section, config)?;

        if !seen.insert(section.keyword.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate section keyword '{}'",
                section.keyword
            )));
        }
    }

    Ok(())
}

fn validate_section(section: &SectionConfig, config: &Config) -> Result<(), ConfigError> {
    if section.keyword.is_empty() {
        return Err(ConfigError::Validation(
            "section keyword cannot be empty".to_string(),
        ));
    }

    // Keywords name checkpoint files, log files, and readiness markers
    if !section
        .keyword
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "section keyword must contain only alphanumeric characters, hyphens, and underscores, got '{}'",
            section.keyword
        )));
    }

    if let Some(page_size) = section.page_size {
        if page_size < 1 {
            return Err(ConfigError::Validation(format!(
                "page_size override for '{}' must be >= 1",
                section.keyword
            )));
        }
    }

    if config.egress.is_some() && section.proxy_port.is_none() {
        return Err(ConfigError::Validation(format!(
            "section '{}' needs a proxy-port because [egress] is configured",
            section.keyword
        )));
    }

    Ok(())
}

fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("{}: '{}' ({:?})", name, selector, e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{EgressConfig, OutputConfig};
    use std::collections::BTreeMap;

    fn base_config() -> Config {
        Config {
            harvest: HarvestConfig {
                default_page_size: 100,
                pacing_min_ms: 2_000,
                pacing_max_ms: 5_000,
                max_restart_attempts: 5,
                restart_backoff_secs: 5,
                startup_cooldown_secs: 60,
                block_markers: vec!["captcha".to_string()],
            },
            source: SourceConfig {
                base_url: "https://listings.example.com".to_string(),
                search_path: "/Search".to_string(),
                ready_selector: "div.result-card".to_string(),
                total_selector: "#totalCount".to_string(),
                bootstrap_timeout_secs: 120,
                bootstrap_poll_ms: 2_000,
            },
            egress: None,
            extractor: ExtractorConfig {
                card_selector: "div.result-card".to_string(),
                link_selector: "a".to_string(),
                fields: BTreeMap::new(),
            },
            output: OutputConfig {
                data_dir: "./data".to_string(),
                log_dir: "./logs".to_string(),
            },
            sections: vec![SectionConfig {
                keyword: "bmw".to_string(),
                proxy_port: None,
                page_size: None,
            }],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_pacing_bounds_ordered() {
        let mut config = base_config();
        config.harvest.pacing_min_ms = 6_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = base_config();
        config.source.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = base_config();
        config.source.ready_selector = ":::".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidSelector(_)
        ));
    }

    #[test]
    fn test_empty_sections_rejected() {
        let mut config = base_config();
        config.sections.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_keywords_rejected() {
        let mut config = base_config();
        config.sections.push(config.sections[0].clone());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_keyword_charset_enforced() {
        let mut config = base_config();
        config.sections[0].keyword = "../escape".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_egress_requires_section_port() {
        let mut config = base_config();
        config.egress = Some(EgressConfig {
            host: "proxy.example.net".to_string(),
            username: None,
            password: None,
        });
        assert!(validate(&config).is_err());

        config.sections[0].proxy_port = Some(20001);
        assert!(validate(&config).is_ok());
    }
}
