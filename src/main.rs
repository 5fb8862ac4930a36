//! Scuttle main entry point
//!
//! Command-line interface for the Scuttle crawler: loads a TOML
//! configuration, wires the engine's collaborators explicitly, and runs the
//! crawl loop.

use clap::Parser;
use scuttle::config::load_config_with_hash;
use scuttle::filter::{rules, UrlFilter};
use scuttle::frontier::Frontier;
use scuttle::scraper::HttpFetcher;
use scuttle::store::{MemoryUrlQueue, MemoryVisitedSet, VisitedSet};
use scuttle::{Config, Engine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Scuttle: a link and email harvesting web crawler
#[derive(Parser, Debug)]
#[command(name = "scuttle")]
#[command(version)]
#[command(about = "A link and email harvesting web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scuttle=info,warn"),
            1 => EnvFilter::new("scuttle=debug,info"),
            2 => EnvFilter::new("scuttle=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Scuttle Dry Run ===\n");
    println!("Config hash: {}", config_hash);

    println!("\nCrawler:");
    println!("  Max in-flight scrapers: {}", config.crawler.max_in_flight);
    println!("  Spawn interval: {}ms", config.crawler.spawn_interval_ms);
    println!("  Refill batch: {}", config.crawler.refill_batch);
    match config.crawler.idle_shutdown_ticks {
        0 => println!("  Idle shutdown: disabled (runs until stopped)"),
        n => println!("  Idle shutdown: after {} idle ticks", n),
    }

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);

    println!("\nFilters:");
    println!("  Rejected extensions: {:?}", config.filters.reject_extensions);
    println!("  Reject query URLs: {}", config.filters.reject_query_urls);
    if let Some(needle) = &config.filters.must_contain {
        println!("  Must contain: {}", needle);
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Wires the engine's collaborators and runs the crawl
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Validation already guaranteed these parse
    let seeds: Vec<Url> = config
        .seeds
        .iter()
        .map(|s| Url::parse(s))
        .collect::<Result<_, _>>()?;

    let visited: Arc<dyn VisitedSet> = Arc::new(MemoryVisitedSet::new());
    let frontier = Arc::new(Frontier::with_refill_batch(
        Arc::new(MemoryUrlQueue::new()),
        config.crawler.refill_batch,
    ));
    let filter = Arc::new(build_pipeline(&config, Arc::clone(&visited)));
    let fetcher = Arc::new(HttpFetcher::with_defaults(
        &config.fetcher.user_agent,
        Duration::from_secs(config.fetcher.timeout_secs),
    )?);

    let engine = Engine::new(
        config.crawler.clone(),
        frontier,
        visited,
        filter,
        fetcher,
    );
    engine.seed(&seeds);

    tracing::info!("Crawling from {} seed URLs", seeds.len());
    engine.run().await;

    tracing::info!(
        "Crawl loop stopped; {} distinct emails discovered",
        engine.emails_seen()
    );
    Ok(())
}

/// Assembles the standard filter pipeline from the configuration.
///
/// The visited check runs last so rejection logs name the cheaper rule that
/// would have dropped the link anyway.
fn build_pipeline(config: &Config, visited: Arc<dyn VisitedSet>) -> UrlFilter {
    let mut filter = UrlFilter::new();

    filter.add_rule("reject-scheme-javascript", rules::reject_scheme("javascript"));
    filter.add_rule("reject-fragment", rules::reject_fragment());
    filter.add_rule("reject-recursive", rules::reject_recursive());

    for extension in &config.filters.reject_extensions {
        filter.add_rule(
            format!("reject-extension-{}", extension),
            rules::reject_extension(extension),
        );
    }

    if config.filters.reject_query_urls {
        filter.add_rule("reject-query", rules::reject_query());
    }

    if let Some(needle) = &config.filters.must_contain {
        filter.add_rule("require-substring", rules::require_substring(needle));
    }

    filter.add_rule("reject-visited", rules::reject_visited(visited));

    filter
}
