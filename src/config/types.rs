use serde::Deserialize;

/// Main configuration structure for Scuttle
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URLs the crawl starts from
    pub seeds: Vec<String>,

    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Ceiling on concurrently in-flight scrapers
    #[serde(rename = "max-in-flight", default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Spawn loop tick interval in milliseconds
    #[serde(rename = "spawn-interval-ms", default = "default_spawn_interval_ms")]
    pub spawn_interval_ms: u64,

    /// URLs pulled from the backing store per frontier refill
    #[serde(rename = "refill-batch", default = "default_refill_batch")]
    pub refill_batch: usize,

    /// Consecutive idle ticks before the crawl loop stops; 0 runs forever
    #[serde(rename = "idle-shutdown-ticks", default = "default_idle_shutdown_ticks")]
    pub idle_shutdown_ticks: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            spawn_interval_ms: default_spawn_interval_ms(),
            refill_batch: default_refill_batch(),
            idle_shutdown_ticks: default_idle_shutdown_ticks(),
        }
    }
}

fn default_max_in_flight() -> usize {
    8
}

fn default_spawn_interval_ms() -> u64 {
    100
}

fn default_refill_batch() -> usize {
    crate::frontier::DEFAULT_REFILL_BATCH
}

fn default_idle_shutdown_ticks() -> u32 {
    50
}

/// Link filter pipeline configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Path extensions to reject, without the leading dot
    #[serde(rename = "reject-extensions", default)]
    pub reject_extensions: Vec<String>,

    /// Reject URLs that carry a query string
    #[serde(rename = "reject-query-urls", default)]
    pub reject_query_urls: bool,

    /// Only follow URLs containing this substring
    #[serde(rename = "must-contain", default)]
    pub must_contain: Option<String>,
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("scuttle/", env!("CARGO_PKG_VERSION")).to_string()
}
