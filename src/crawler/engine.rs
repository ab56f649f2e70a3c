//! Crawl engine
//!
//! Wires the queues, the fetch workers and the dispatcher together for one
//! crawl invocation. All frontier state lives inside that invocation, so
//! repeated or concurrent crawls never share a visited set.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::dispatcher::Dispatcher;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::queue::{result_queue, task_queue};
use crate::crawler::task::CrawlTask;
use crate::crawler::worker::{RetryPolicy, Worker};
use crate::output::CrawlStats;
use crate::url::normalize_url;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Tuning knobs that do not change what gets crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    pub retry: RetryPolicy,

    /// Results processed between progress log lines
    pub progress_interval: u64,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            progress_interval: 50,
        }
    }
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            retry: RetryPolicy {
                max_retries: config.max_retries,
                delay: Duration::from_millis(config.retry_delay_ms),
            },
            progress_interval: config.progress_interval,
        }
    }
}

/// Outcome of one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The normalized seed URL
    pub seed: Url,
    pub max_depth: u32,
    pub worker_count: usize,

    /// Every URL admitted into the frontier, the seed included
    pub visited: HashSet<String>,
    pub stats: CrawlStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// True if the crawl was stopped before the frontier drained
    pub cancelled: bool,
}

impl CrawlReport {
    /// Visited URLs in lexicographic order
    pub fn sorted_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.visited.iter().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Concurrent same-host crawler
///
/// The fetcher and link extractor are shared by every worker of every crawl
/// run through this instance.
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn LinkExtractor>) -> Self {
        Self {
            fetcher,
            extractor,
            options: CrawlOptions::default(),
        }
    }

    /// Builds an HTTP crawler from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.http, &config.user_agent)?;
        Ok(Self::new(Arc::new(fetcher), Arc::new(HtmlLinkExtractor))
            .with_options(CrawlOptions::from(&config.crawler)))
    }

    pub fn with_options(mut self, options: CrawlOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawls from `seed` until every reachable page within `max_depth` has been processed
    ///
    /// Fails only if the seed is not a valid http(s) URL; individual page
    /// failures reduce coverage but never abort the crawl.
    pub async fn crawl(&self, seed: &str, max_depth: u32, worker_count: usize) -> Result<CrawlReport> {
        self.crawl_with_cancellation(seed, max_depth, worker_count, CancellationToken::new())
            .await
    }

    /// Like [`Crawler::crawl`], but stops early once `cancel` fires
    ///
    /// A cancelled crawl still waits for every worker to exit and returns the
    /// URLs admitted so far with `cancelled` set.
    pub async fn crawl_with_cancellation(
        &self,
        seed: &str,
        max_depth: u32,
        worker_count: usize,
        cancel: CancellationToken,
    ) -> Result<CrawlReport> {
        let seed_url = normalize_url(seed)?;
        let started_at = Utc::now();

        let worker_count = if worker_count == 0 {
            tracing::warn!("Worker count of 0 requested, using 1");
            1
        } else {
            worker_count
        };

        tracing::info!(
            "Starting crawl of {} (max depth: {}, workers: {})",
            seed_url,
            max_depth,
            worker_count
        );

        // Stopping on a failed worker must not cancel the caller's token
        let cancel = cancel.child_token();

        let (task_tx, task_rx) = task_queue();
        let (result_tx, result_rx) = result_queue();

        // The seed is visited and pending before any worker can report a link back to it
        let seed_task = CrawlTask::seed(seed_url.clone());
        let dispatcher = Dispatcher::new(&seed_task, max_depth, task_tx.clone())
            .with_progress_interval(self.options.progress_interval);

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker::new(
                id,
                Arc::clone(&self.fetcher),
                Arc::clone(&self.extractor),
                self.options.retry,
                task_rx.clone(),
                result_tx.clone(),
                cancel.clone(),
            );
            workers.spawn(worker.run());
        }
        drop(task_rx);
        drop(result_tx);

        let mut dispatch = tokio::spawn(dispatcher.run(result_rx, cancel.clone()));

        if let Err(task) = task_tx.push(seed_task) {
            tracing::warn!("No workers available for seed {}", task.url);
        }
        drop(task_tx);

        // A worker that dies mid-task never answers it, so the crawl is stopped
        // rather than left waiting on a counter that cannot reach zero
        let mut worker_failure = None;
        let summary = loop {
            tokio::select! {
                summary = &mut dispatch => break summary?,
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        if worker_failure.is_none() {
                            tracing::error!("Worker task failed, stopping crawl: {}", e);
                            cancel.cancel();
                            worker_failure = Some(e);
                        }
                    }
                }
            }
        };
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                worker_failure.get_or_insert(e);
            }
        }
        if let Some(e) = worker_failure {
            return Err(e.into());
        }

        let finished_at = Utc::now();
        if summary.cancelled {
            tracing::info!(
                "Crawl cancelled: {} URLs visited, {} tasks abandoned",
                summary.visited.len(),
                summary.pending
            );
        } else {
            tracing::info!(
                "Crawl finished: {} URLs visited in {}ms",
                summary.visited.len(),
                (finished_at - started_at).num_milliseconds()
            );
        }

        Ok(CrawlReport {
            seed: seed_url,
            max_depth,
            worker_count,
            visited: summary.visited.into_urls(),
            stats: summary.stats,
            started_at,
            finished_at,
            cancelled: summary.cancelled,
        })
    }
}
