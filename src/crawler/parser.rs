//! HTML link extraction
//!
//! Extractors return raw, unresolved href strings exactly as written in the
//! markup. Resolution and filtering happen in [`crate::url`].

use scraper::{Html, Selector};

/// Pulls candidate hrefs out of a fetched page body
pub trait LinkExtractor: Send + Sync {
    /// Returns raw href values in document order; never fails
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String>;
}

/// [`LinkExtractor`] backed by an HTML5 parser
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - stylesheets, scripts and images
///
/// Body bytes are decoded as UTF-8 with invalid sequences replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);
        let mut hrefs = Vec::new();

        if let Ok(selector) = Selector::parse("a[href], link[rel='canonical'][href]") {
            for element in document.select(&selector) {
                let element = element.value();

                // Skip if it has the download attribute
                if element.name() == "a" && element.attr("download").is_some() {
                    continue;
                }

                if let Some(href) = element.attr("href") {
                    hrefs.push(href.to_string());
                }
            }
        }

        hrefs
    }
}
