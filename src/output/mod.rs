//! Output module for presenting crawl results
//!
//! This module handles:
//! - Rendering the site map as plain text or markdown
//! - Writing it to a file or stdout
//! - Printing crawl statistics

mod markdown;
pub mod stats;

pub use markdown::format_markdown_site_map;
pub use stats::{print_statistics, CrawlStats};

use crate::crawler::CrawlReport;
use crate::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Presentation format of the site map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One URL per line under a header
    #[default]
    Text,

    /// Markdown document with run information and statistics
    Markdown,
}

/// Renders the visited URLs of a report in the given format
pub fn render_site_map(report: &CrawlReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_text_site_map(report),
        OutputFormat::Markdown => format_markdown_site_map(report),
    }
}

fn format_text_site_map(report: &CrawlReport) -> String {
    let mut text = String::from("--- Site Map ---\n");
    for url in report.sorted_urls() {
        text.push_str(url);
        text.push('\n');
    }
    text
}

/// Writes the rendered site map to `path`, or to stdout when no path is given
pub fn write_site_map(report: &CrawlReport, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    let rendered = render_site_map(report, format);

    match path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(rendered.as_bytes())?;
            tracing::info!("Site map written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(rendered.as_bytes())?;
            handle.flush()?;
        }
    }

    Ok(())
}
