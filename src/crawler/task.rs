//! Messages exchanged between the dispatcher and the fetch workers

use std::sync::Arc;
use url::Url;

/// A single page to fetch
///
/// Created by the dispatcher (the seed task by the engine) and never modified
/// afterwards. `base_url` is the seed URL and defines the domain boundary for
/// every link discovered beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// The page to fetch
    pub url: Url,

    /// The seed URL this task descends from
    pub base_url: Arc<Url>,

    /// Link distance from the seed (the seed is depth 0)
    pub depth: u32,
}

impl CrawlTask {
    /// Creates the depth-0 task for a seed URL
    pub fn seed(url: Url) -> Self {
        Self {
            base_url: Arc::new(url.clone()),
            url,
            depth: 0,
        }
    }

    /// Creates a task beneath an existing seed
    pub fn new(url: Url, base_url: Arc<Url>, depth: u32) -> Self {
        Self {
            url,
            base_url,
            depth,
        }
    }
}

/// The outcome of processing one [`CrawlTask`]
///
/// Exactly one result is produced per task. A failed fetch carries no links.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The task this result answers
    pub parent_task: CrawlTask,

    /// Same-host links found on the page, in document order
    pub found_links: Vec<Url>,

    /// False when the fetch failed
    pub ok: bool,
}

impl CrawlResult {
    /// A successful fetch with the filtered links it produced
    pub fn success(parent_task: CrawlTask, found_links: Vec<Url>) -> Self {
        Self {
            parent_task,
            found_links,
            ok: true,
        }
    }

    /// A failed fetch; the task is treated as having no children
    pub fn failure(parent_task: CrawlTask) -> Self {
        Self {
            parent_task,
            found_links: Vec::new(),
            ok: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_its_own_base() {
        let seed = CrawlTask::seed(Url::parse("https://example.com/").unwrap());
        assert_eq!(seed.depth, 0);
        assert_eq!(seed.base_url.as_str(), seed.url.as_str());
    }

    #[test]
    fn test_new_shares_base() {
        let seed = CrawlTask::seed(Url::parse("https://example.com/").unwrap());
        let task = CrawlTask::new(
            Url::parse("https://example.com/a").unwrap(),
            Arc::clone(&seed.base_url),
            1,
        );
        assert_eq!(task.depth, 1);
        assert!(Arc::ptr_eq(&seed.base_url, &task.base_url));
    }

    #[test]
    fn test_failure_has_no_links() {
        let seed = CrawlTask::seed(Url::parse("https://example.com/").unwrap());
        let result = CrawlResult::failure(seed);
        assert!(!result.ok);
        assert!(result.found_links.is_empty());
    }
}
