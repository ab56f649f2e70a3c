//! Markdown site map generation
//!
//! Renders a crawl report as a human-readable markdown document with run
//! information, statistics and the sorted list of discovered URLs.

use crate::crawler::CrawlReport;

/// Formats a crawl report as markdown
pub fn format_markdown_site_map(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Site Map\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", report.seed));
    md.push_str(&format!("- **Max Depth**: {}\n", report.max_depth));
    md.push_str(&format!("- **Workers**: {}\n", report.worker_count));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    let duration_ms = report.duration().num_milliseconds();
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        duration_ms as f64 / 1000.0
    ));
    let status = if report.cancelled { "Cancelled" } else { "Completed" };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    let stats = &report.stats;
    md.push_str("## Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| URLs Visited | {} |\n", report.visited.len()));
    md.push_str(&format!("| Pages Fetched | {} |\n", stats.pages_fetched));
    md.push_str(&format!("| Pages Failed | {} |\n", stats.pages_failed));
    md.push_str(&format!("| Same-Host Links | {} |\n", stats.links_found));
    md.push_str(&format!(
        "| Duplicate Links Skipped | {} |\n",
        stats.duplicate_links
    ));
    md.push_str(&format!(
        "| Pages at Depth Limit | {} |\n",
        stats.depth_limited
    ));
    md.push_str(&format!(
        "| Deepest Level Queued | {} |\n\n",
        stats.max_depth_reached
    ));
    md.push_str(&format!(
        "**Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    md.push_str("## URLs\n\n");
    for url in report.sorted_urls() {
        md.push_str(&format!("- <{}>\n", url));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CrawlStats;
    use chrono::{TimeZone, Utc};
    use url::Url;

    fn report(cancelled: bool) -> CrawlReport {
        let started_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        CrawlReport {
            seed: Url::parse("https://example.com/").unwrap(),
            max_depth: 2,
            worker_count: 4,
            visited: ["https://example.com/b", "https://example.com/", "https://example.com/a"]
                .into_iter()
                .map(String::from)
                .collect(),
            stats: CrawlStats {
                results_processed: 3,
                pages_fetched: 2,
                pages_failed: 1,
                ..Default::default()
            },
            started_at,
            finished_at: started_at + chrono::Duration::milliseconds(1500),
            cancelled,
        }
    }

    #[test]
    fn test_markdown_sections() {
        let md = format_markdown_site_map(&report(false));

        assert!(md.starts_with("# Site Map\n"));
        assert!(md.contains("- **Seed**: https://example.com/\n"));
        assert!(md.contains("- **Duration**: 1.50 seconds\n"));
        assert!(md.contains("- **Status**: Completed\n"));
        assert!(md.contains("| URLs Visited | 3 |\n"));
        assert!(md.contains("| Pages Failed | 1 |\n"));
        assert!(md.contains("**Success Rate**: 66.67%"));
    }

    #[test]
    fn test_markdown_urls_sorted() {
        let md = format_markdown_site_map(&report(false));
        let urls = md.split("## URLs\n\n").nth(1).unwrap();

        assert_eq!(
            urls,
            "- <https://example.com/>\n- <https://example.com/a>\n- <https://example.com/b>\n"
        );
    }

    #[test]
    fn test_markdown_cancelled_status() {
        let md = format_markdown_site_map(&report(true));
        assert!(md.contains("- **Status**: Cancelled\n"));
    }
}
