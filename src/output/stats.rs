//! Crawl statistics
//!
//! Counters are maintained by the frontier dispatcher while it processes
//! results, so they are exact without any synchronization.

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Tasks created, including the seed
    pub tasks_created: u64,

    /// Results consumed by the dispatcher
    pub results_processed: u64,

    /// Pages fetched successfully
    pub pages_fetched: u64,

    /// Pages whose fetch failed
    pub pages_failed: u64,

    /// Same-host links reported by workers
    pub links_found: u64,

    /// Links skipped because the URL was already visited
    pub duplicate_links: u64,

    /// Successful pages not expanded because they sit at the depth limit
    pub depth_limited: u64,

    /// Times a visited URL was reached by a shorter path
    pub depth_improvements: u64,

    /// Deepest depth at which a task was created
    pub max_depth_reached: u32,
}

impl CrawlStats {
    /// Fraction of processed results that were fetched successfully, in percent
    pub fn success_rate(&self) -> f64 {
        if self.results_processed == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / self.results_processed as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Tasks created: {}", stats.tasks_created);
    println!("  Results processed: {}", stats.results_processed);
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Pages failed: {}", stats.pages_failed);
    println!();

    println!("Links:");
    println!("  Same-host links found: {}", stats.links_found);
    println!("  Duplicates skipped: {}", stats.duplicate_links);
    println!("  Pages at depth limit: {}", stats.depth_limited);
    println!("  Shorter paths found: {}", stats.depth_improvements);
    println!("  Deepest level queued: {}", stats.max_depth_reached);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully fetched)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.results_processed
    );
}
