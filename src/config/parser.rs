use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Used to detect whether the configuration changed between runs, since a
/// resumed checkpoint is only meaningful against the same section list.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r##"
[harvest]
default-page-size = 100

[source]
base-url = "https://listings.example.com"
ready-selector = "div.result-card"
total-selector = "#totalCount"

[egress]
host = "proxy.example.net"
username = "user"
password = "secret"

[extractor]
card-selector = "div.result-card"

[extractor.fields]
odometer = "span.odometer"

[output]
data-dir = "./data"
log-dir = "./logs"

[[section]]
keyword = "bmw"
proxy-port = 20001
page-size = 50

[[section]]
keyword = "audi"
proxy-port = 20002
"##;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.harvest.default_page_size, 100);
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[0].keyword, "bmw");
        assert_eq!(config.sections[0].page_size, Some(50));
        assert_eq!(config.sections[1].page_size, None);
        assert_eq!(config.page_size_for(&config.sections[0]), 50);
        assert_eq!(config.page_size_for(&config.sections[1]), 100);
    }

    #[test]
    fn test_defaults_applied() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.harvest.max_restart_attempts, 5);
        assert_eq!(config.harvest.restart_backoff_secs, 5);
        assert_eq!(config.harvest.startup_cooldown_secs, 60);
        assert_eq!(config.harvest.block_markers, vec!["captcha", "incapsula"]);
        assert_eq!(config.source.search_path, "/Search");
        assert_eq!(config.source.bootstrap_timeout_secs, 120);
    }

    #[test]
    fn test_section_paths() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert!(config
            .checkpoint_path("bmw")
            .ends_with("data/bmw_items.json"));
        assert!(config.readiness_path("bmw").ends_with("data/bmw.ready"));
        assert!(config.log_path("bmw").ends_with("logs/bmw.log"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
