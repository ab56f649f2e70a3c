//! Fetch worker loop
//!
//! Workers pull tasks, fetch and extract, filter links to the seed's host and
//! hand a result back. They never decide whether a link gets crawled.

use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::queue::{ResultSender, TaskReceiver};
use crate::crawler::task::{CrawlResult, CrawlTask};
use crate::url::filter_same_host;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a worker re-attempts retryable fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,

    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::from_millis(500),
        }
    }
}

/// One fetch worker
pub struct Worker {
    id: usize,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    retry: RetryPolicy,
    tasks: TaskReceiver,
    results: ResultSender,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        id: usize,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        retry: RetryPolicy,
        tasks: TaskReceiver,
        results: ResultSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            fetcher,
            extractor,
            retry,
            tasks,
            results,
            cancel,
        }
    }

    /// Runs until the task queue closes or the crawl is cancelled
    ///
    /// Exactly one result is sent per task taken, except for a task that is
    /// in flight when cancellation arrives: that one is abandoned.
    pub async fn run(self) {
        tracing::debug!("Worker {} started", self.id);

        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                task = self.tasks.next() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.process(task) => result,
            };

            if self.results.send(result).is_err() {
                tracing::debug!("Worker {}: result queue closed", self.id);
                break;
            }
        }

        tracing::debug!("Worker {} exiting", self.id);
    }

    /// Fetches one page and turns it into a result
    async fn process(&self, task: CrawlTask) -> CrawlResult {
        tracing::debug!(
            "Worker {} processing: {} (depth: {})",
            self.id,
            task.url,
            task.depth
        );

        match self.fetch_with_retry(task.url.as_str()).await {
            Ok(body) => {
                let hrefs = self.extractor.extract_hrefs(&body);
                let links = filter_same_host(&task.base_url, &hrefs);
                tracing::debug!(
                    "Worker {}: {} hrefs on {}, {} on-site",
                    self.id,
                    hrefs.len(),
                    task.url,
                    links.len()
                );
                CrawlResult::success(task, links)
            }
            Err(e) => {
                tracing::warn!("Worker {}: failed to fetch {}: {}", self.id, task.url, e);
                CrawlResult::failure(task)
            }
        }
    }

    /// Fetches a URL, re-attempting retryable failures of the same task
    async fn fetch_with_retry(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 0;

        loop {
            match self.fetcher.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Worker {}: retrying {} ({}/{}) after: {}",
                        self.id,
                        url,
                        attempt,
                        self.retry.max_retries,
                        e
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
