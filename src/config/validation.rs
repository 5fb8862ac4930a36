//! Configuration validation
//!
//! Catches configurations that would make the crawl misbehave silently:
//! unparseable seeds, a zero concurrency ceiling, extension entries written
//! with the dot they must not carry.

use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        Url::parse(seed).map_err(|source| ConfigError::InvalidSeed {
            url: seed.clone(),
            source,
        })?;
    }

    if config.crawler.max_in_flight == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-in-flight must be greater than zero".to_string(),
        ));
    }

    if config.crawler.spawn_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "crawler.spawn-interval-ms must be greater than zero".to_string(),
        ));
    }

    if config.crawler.refill_batch == 0 {
        return Err(ConfigError::Validation(
            "crawler.refill-batch must be greater than zero".to_string(),
        ));
    }

    for extension in &config.filters.reject_extensions {
        if extension.is_empty() || extension.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "filters.reject-extensions entry {:?} must be a bare extension without the dot",
                extension
            )));
        }
    }

    if let Some(needle) = &config.filters.must_contain {
        if needle.is_empty() {
            return Err(ConfigError::Validation(
                "filters.must-contain must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}
