//! Crawler module for concurrent same-host site mapping
//!
//! This module contains the crawl machinery:
//! - HTTP fetching and HTML link extraction behind narrow traits
//! - Fetch workers that run concurrently on a shared task queue
//! - A single dispatcher that owns deduplication, depth and termination
//! - The engine that wires them together for one crawl invocation

mod dispatcher;
mod engine;
mod fetcher;
mod parser;
mod queue;
mod task;
mod worker;

pub use dispatcher::{DispatchSummary, Dispatcher, PendingCounter, VisitedSet};
pub use engine::{CrawlOptions, CrawlReport, Crawler};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher};
pub use parser::{HtmlLinkExtractor, LinkExtractor};
pub use queue::{result_queue, task_queue, ResultReceiver, ResultSender, TaskReceiver, TaskSender};
pub use task::{CrawlResult, CrawlTask};
pub use worker::{RetryPolicy, Worker};

use crate::config::Config;
use crate::Result;
use std::collections::HashSet;

/// Crawls a site over HTTP with default settings
///
/// Returns every same-host URL reachable from `seed` within `max_depth`
/// links, the seed included. Fails only for an invalid seed URL.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> site_mapper::Result<()> {
/// let urls = site_mapper::crawler::crawl("https://example.com/", 2, 4).await?;
/// for url in &urls {
///     println!("{}", url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(seed: &str, max_depth: u32, worker_count: usize) -> Result<HashSet<String>> {
    let crawler = Crawler::from_config(&Config::default())?;
    let report = crawler.crawl(seed, max_depth, worker_count).await?;
    Ok(report.visited)
}

/// Runs a crawl with the settings from `config`
///
/// Depth, worker count, retries and HTTP behavior all come from the
/// configuration.
pub async fn run_crawl(config: &Config, seed: &str) -> Result<CrawlReport> {
    let crawler = Crawler::from_config(config)?;
    crawler
        .crawl(seed, config.crawler.max_depth, config.crawler.workers)
        .await
}
