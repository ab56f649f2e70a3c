//! Frontier dispatcher
//!
//! The dispatcher is the single consumer of crawl results and the single
//! producer of crawl tasks. It exclusively owns the visited set and the
//! pending-operation counter, so neither needs a lock: every read and write
//! happens on the one task that runs [`Dispatcher::run`].
//!
//! # Counting
//!
//! The pending counter starts at 1 for the seed. Each admitted child
//! increments it before its task is enqueued, and a parent is decremented only
//! after all of its children have been considered. The counter can therefore
//! only reach zero when no task is queued, in flight, or about to be created.
//!
//! # Depth
//!
//! A URL is fetched at most once, but it may be reached again through a
//! shorter path after its first discovery. The visited set keeps the best
//! known depth per URL plus the links of every page already fetched, and a
//! shorter path re-expands those cached links. The set of visited URLs is
//! therefore the same whatever order the workers finish in.
//!
//! Cached links make memory grow with the number of same-host edges, not
//! just with the number of URLs. Pages at depth 0 or 1 can never be reached
//! by a shorter path, so their links are released once expanded.

use crate::crawler::queue::{ResultReceiver, TaskSender};
use crate::crawler::task::{CrawlResult, CrawlTask};
use crate::output::CrawlStats;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug)]
struct Visit {
    /// Shortest known link distance from the seed
    depth: u32,
    /// Fetched successfully
    fetched: bool,
    /// Links have been considered for admission at least once
    expanded: bool,
    /// Same-host links of a fetched page, kept while a shorter path could still re-expand it
    links: Vec<Url>,
}

/// Every URL ever admitted into the frontier, keyed by normalized URL
#[derive(Debug, Default)]
pub struct VisitedSet {
    entries: HashMap<String, Visit>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a URL at the given depth; false if it was already present
    pub fn insert(&mut self, url: &Url, depth: u32) -> bool {
        match self.entries.entry(url.as_str().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Visit {
                    depth,
                    fetched: false,
                    expanded: false,
                    links: Vec::new(),
                });
                true
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Shortest known depth of a visited URL
    pub fn depth_of(&self, url: &str) -> Option<u32> {
        self.entries.get(url).map(|visit| visit.depth)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the set, returning the visited URLs
    pub fn into_urls(self) -> HashSet<String> {
        self.entries.into_keys().collect()
    }

    fn set_depth(&mut self, url: &str, depth: u32) {
        if let Some(visit) = self.entries.get_mut(url) {
            visit.depth = depth;
        }
    }

    fn record_links(&mut self, url: &str, links: Vec<Url>) {
        if let Some(visit) = self.entries.get_mut(url) {
            visit.fetched = true;
            visit.links = links;
        }
    }

    fn is_fetched(&self, url: &str) -> bool {
        self.entries.get(url).map_or(false, |visit| visit.fetched)
    }

    /// Takes the links of a fetched page for expansion
    ///
    /// Returns the page depth, the links and whether it had been expanded
    /// before. The links must be handed back with [`VisitedSet::restore_links`].
    fn take_expansion(&mut self, url: &str) -> Option<(u32, Vec<Url>, bool)> {
        let visit = self.entries.get_mut(url)?;
        if !visit.fetched {
            return None;
        }
        let expanded_before = visit.expanded;
        visit.expanded = true;
        Some((visit.depth, std::mem::take(&mut visit.links), expanded_before))
    }

    fn restore_links(&mut self, url: &str, links: Vec<Url>) {
        if let Some(visit) = self.entries.get_mut(url) {
            // Depth 0 and 1 are final, nothing can re-expand them
            if visit.depth > 1 {
                visit.links = links;
            }
        }
    }

    /// Number of links currently cached for a page
    #[cfg(test)]
    fn cached_links(&self, url: &str) -> usize {
        self.entries.get(url).map_or(0, |visit| visit.links.len())
    }
}

/// Count of crawl tasks created but not yet fully processed
#[derive(Debug, Default)]
pub struct PendingCounter {
    count: u64,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }

    /// Decrements and returns the remaining count
    pub fn decrement(&mut self) -> u64 {
        debug_assert!(self.count > 0, "pending counter underflow");
        self.count = self.count.saturating_sub(1);
        self.count
    }

    pub fn get(&self) -> u64 {
        self.count
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0
    }
}

/// What the dispatcher hands back to the engine when it stops
#[derive(Debug)]
pub struct DispatchSummary {
    pub visited: VisitedSet,
    pub stats: CrawlStats,
    /// True if the crawl stopped on the cancellation token
    pub cancelled: bool,
    /// Tasks still outstanding when the dispatcher stopped (zero on completion)
    pub pending: u64,
}

/// Sole owner of the frontier state
pub struct Dispatcher {
    max_depth: u32,
    base_url: Arc<Url>,
    visited: VisitedSet,
    pending: PendingCounter,
    tasks: Option<TaskSender>,
    stats: CrawlStats,
    progress_interval: u64,
}

impl Dispatcher {
    /// Creates a dispatcher with the seed already admitted
    ///
    /// The seed is marked visited and counted as pending here, before any
    /// worker exists, so a link back to the seed can never be admitted twice.
    /// The caller is responsible for enqueuing the seed task itself.
    pub fn new(seed: &CrawlTask, max_depth: u32, tasks: TaskSender) -> Self {
        let mut visited = VisitedSet::new();
        visited.insert(&seed.url, seed.depth);

        let mut pending = PendingCounter::new();
        pending.increment();

        Self {
            max_depth,
            base_url: Arc::clone(&seed.base_url),
            visited,
            pending,
            tasks: Some(tasks),
            stats: CrawlStats {
                tasks_created: 1,
                max_depth_reached: seed.depth,
                ..Default::default()
            },
            progress_interval: 50,
        }
    }

    /// Sets how many results pass between progress log lines
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn pending(&self) -> u64 {
        self.pending.get()
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Consumes results until the pending counter reaches zero or the crawl is cancelled
    ///
    /// On cancellation the task queue is closed and every result still in
    /// flight is drained and discarded until all workers have gone.
    pub async fn run(mut self, mut results: ResultReceiver, cancel: CancellationToken) -> DispatchSummary {
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = results.recv() => result,
            };

            match result {
                Some(result) => {
                    if self.handle_result(result) {
                        return self.finish(false);
                    }
                }
                None => {
                    tracing::warn!(
                        "All workers exited with {} tasks still pending",
                        self.pending.get()
                    );
                    return self.finish(false);
                }
            }
        }

        self.cancel(results).await
    }

    /// Processes one result; returns true once the crawl is complete
    ///
    /// 1. A failed fetch releases its task and adds nothing.
    /// 2. A page at the depth limit releases its task without expansion.
    /// 3. Otherwise each unseen link is marked visited, counted and enqueued,
    ///    in the order the links were found, and only then is the parent released.
    pub fn handle_result(&mut self, result: CrawlResult) -> bool {
        let CrawlResult {
            parent_task,
            found_links,
            ok,
        } = result;
        let page = parent_task.url;

        self.stats.results_processed += 1;

        if ok {
            self.stats.pages_fetched += 1;
            self.stats.links_found += found_links.len() as u64;

            let depth = self
                .visited
                .depth_of(page.as_str())
                .unwrap_or(parent_task.depth);
            let limited = depth >= self.max_depth;

            // A held-back page keeps its links only if a shorter path could still reach it
            let links = if limited && depth <= 1 {
                Vec::new()
            } else {
                found_links
            };
            self.visited.record_links(page.as_str(), links);

            if limited {
                self.stats.depth_limited += 1;
            } else {
                self.expand(page);
            }
        } else {
            self.stats.pages_failed += 1;
        }

        self.report_progress();

        if self.pending.decrement() > 0 {
            return false;
        }

        tracing::info!(
            "All tasks complete after {} results, closing task queue",
            self.stats.results_processed
        );
        self.tasks = None;
        true
    }

    /// Admits the unseen links of a fetched page, re-expanding any fetched
    /// page that the walk reaches by a shorter path
    ///
    /// Statistics count each page once: duplicates are only tallied on a
    /// page's first expansion, and a page that was held at the depth limit
    /// leaves `depth_limited` when a shorter path lets it expand.
    fn expand(&mut self, page: Url) {
        let mut worklist = vec![(page, false)];

        while let Some((page, shorter_path)) = worklist.pop() {
            if self
                .visited
                .depth_of(page.as_str())
                .map_or(true, |depth| depth >= self.max_depth)
            {
                continue;
            }
            let (depth, links, expanded_before) = match self.visited.take_expansion(page.as_str()) {
                Some(expansion) => expansion,
                None => continue,
            };

            let child_depth = depth + 1;
            for link in &links {
                match self.visited.depth_of(link.as_str()) {
                    None => self.admit(link.clone(), child_depth),
                    Some(known) if known > child_depth => {
                        tracing::debug!(
                            "Shorter path to {} (depth {} -> {})",
                            link,
                            known,
                            child_depth
                        );
                        self.visited.set_depth(link.as_str(), child_depth);
                        self.stats.depth_improvements += 1;
                        if self.visited.is_fetched(link.as_str()) {
                            worklist.push((link.clone(), true));
                        }
                    }
                    Some(_) => {
                        if !expanded_before {
                            self.stats.duplicate_links += 1;
                        }
                    }
                }
            }

            // A fetched page first expanded through a shorter path was held at the depth limit
            if shorter_path && !expanded_before {
                self.stats.depth_limited = self.stats.depth_limited.saturating_sub(1);
            }
            self.visited.restore_links(page.as_str(), links);
        }
    }

    /// Marks a URL visited, counts it and enqueues its task
    fn admit(&mut self, url: Url, depth: u32) {
        self.visited.insert(&url, depth);
        self.pending.increment();
        self.stats.tasks_created += 1;
        self.stats.max_depth_reached = self.stats.max_depth_reached.max(depth);

        tracing::debug!("Queueing new task: {} (depth: {})", url, depth);

        let task = CrawlTask::new(url, Arc::clone(&self.base_url), depth);
        if let Some(tasks) = &self.tasks {
            if let Err(task) = tasks.push(task) {
                // No worker will ever answer it; the parent still holds the count above zero
                tracing::warn!("No workers left to fetch {}", task.url);
                self.pending.decrement();
            }
        }
    }

    fn report_progress(&self) {
        if self.stats.results_processed % self.progress_interval == 0 {
            tracing::info!(
                "Progress: {} results processed, {} pending, {} visited",
                self.stats.results_processed,
                self.pending.get(),
                self.visited.len()
            );
        }
    }

    async fn cancel(mut self, mut results: ResultReceiver) -> DispatchSummary {
        tracing::info!(
            "Crawl cancelled with {} tasks pending, draining in-flight results",
            self.pending.get()
        );
        self.tasks = None;

        let mut drained = 0u64;
        while results.recv().await.is_some() {
            drained += 1;
        }
        tracing::debug!("Discarded {} in-flight results", drained);

        self.finish(true)
    }

    fn finish(mut self, cancelled: bool) -> DispatchSummary {
        self.tasks = None;
        DispatchSummary {
            visited: self.visited,
            stats: self.stats,
            cancelled,
            pending: self.pending.get(),
        }
    }
}
