//! Scuttle: a link and email harvesting web crawler
//!
//! This crate implements a bounded-concurrency web crawler that fetches pages,
//! extracts outbound links and email addresses, filters discovered links
//! through a rule pipeline, and feeds accepted links back into a two-tier
//! work queue.

pub mod config;
pub mod engine;
pub mod extract;
pub mod filter;
pub mod frontier;
pub mod scraper;
pub mod store;

use thiserror::Error;

/// Main error type for Scuttle operations
#[derive(Debug, Error)]
pub enum ScuttleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] scraper::FetchError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] scraper::ScrapeError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

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

    #[error("Invalid seed URL {url}: {source}")]
    InvalidSeed {
        url: String,
        source: url::ParseError,
    },
}

/// Result type alias for Scuttle operations
pub type Result<T> = std::result::Result<T, ScuttleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::Engine;
pub use extract::{extract, EmailAddress, Extraction};
pub use filter::UrlFilter;
pub use frontier::Frontier;
pub use scraper::{ScrapeState, Scraper};
