//! Site-Mapper main entry point
//!
//! This is the command-line interface for the Site-Mapper crawler.

use anyhow::Context;
use clap::Parser;
use site_mapper::config::{load_config_with_hash, validate, Config};
use site_mapper::crawler::Crawler;
use site_mapper::normalize_url;
use site_mapper::output::{print_statistics, write_site_map, OutputFormat};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Mapper: a concurrent same-domain site mapper
///
/// Site-Mapper discovers every page reachable from a seed URL on the seed's
/// host, up to a maximum link depth, fetching pages with a pool of
/// concurrent workers and visiting each URL exactly once.
#[derive(Parser, Debug)]
#[command(name = "site-mapper")]
#[command(version)]
#[command(about = "A concurrent same-domain site mapper", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum link depth to expand from the seed
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Number of concurrent fetch workers
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Site map output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the site map to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seed and show the effective settings without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;

    normalize_url(&cli.seed).with_context(|| format!("Invalid seed URL: {}", cli.seed))?;

    if cli.dry_run {
        handle_dry_run(&config, &cli.seed);
        return Ok(());
    }

    handle_crawl(&config, &cli.seed, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mapper=info,warn"),
            1 => EnvFilter::new("site_mapper=debug,info"),
            2 => EnvFilter::new("site_mapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file (or defaults) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(output) = &cli.output {
        config.output.path = Some(output.display().to_string());
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, seed: &str) {
    println!("=== Site-Mapper Dry Run ===\n");

    println!("Seed: {}\n", seed);

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);

    println!("\nHTTP:");
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  HTML only: {}", config.http.html_only);
    println!("  User-Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Format: {:?}", config.output.format);
    println!(
        "  Destination: {}",
        config.output.path.as_deref().unwrap_or("stdout")
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, seed: &str, quiet: bool) -> anyhow::Result<()> {
    let crawler = Crawler::from_config(config).context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received interrupt, stopping crawl");
            shutdown.cancel();
        }
    });

    let report = crawler
        .crawl_with_cancellation(
            seed,
            config.crawler.max_depth,
            config.crawler.workers,
            cancel,
        )
        .await
        .context("Crawl failed")?;

    if report.cancelled {
        tracing::warn!("Crawl was interrupted; the site map is partial");
    }

    let path = config.output.path.as_deref().map(Path::new);
    write_site_map(&report, config.output.format, path).context("Failed to write site map")?;

    if !quiet {
        println!();
        print_statistics(&report.stats);
    }

    Ok(())
}
