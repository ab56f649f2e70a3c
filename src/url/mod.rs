//! URL handling module for Site-Mapper
//!
//! This module provides URL normalization, host comparison and the
//! same-domain link filter applied by fetch workers.

mod domain;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::{extract_domain, same_host};
pub use normalize::normalize_url;

/// Resolves a raw href against a base URL and keeps it only if it stays on
/// the base's host
///
/// The href is parsed as a reference relative to `base`, so relative paths,
/// protocol-relative URLs (`//host/path`) and fragments are all handled.
/// Hrefs that fail to parse, resolve to a non-HTTP(S) scheme, or land on a
/// different host are rejected. Rejection is never an error for the caller;
/// the link is simply left out.
///
/// Accepted URLs are returned in their normalized form (see [`normalize_url`]).
///
/// # Examples
///
/// ```
/// use site_mapper::url::resolve_same_host;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let about = resolve_same_host(&base, "/about#team").unwrap();
/// assert_eq!(about.as_str(), "https://example.com/about");
///
/// assert!(resolve_same_host(&base, "https://other.example/page").is_none());
/// ```
pub fn resolve_same_host(base: &Url, href: &str) -> Option<Url> {
    let resolved = match base.join(href.trim()) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::debug!("Dropping unparseable href {:?}: {}", href, e);
            return None;
        }
    };

    if let Err(e) = normalize::check_web_url(&resolved) {
        tracing::debug!("Dropping href {:?}: {}", href, e);
        return None;
    }

    if !same_host(base, &resolved) {
        tracing::debug!("Dropping off-site href {}", resolved);
        return None;
    }

    Some(normalize::canonicalize(resolved))
}

/// Applies [`resolve_same_host`] to every href, preserving order
pub fn filter_same_host(base: &Url, hrefs: &[String]) -> Vec<Url> {
    hrefs
        .iter()
        .filter_map(|href| resolve_same_host(base, href))
        .collect()
}
