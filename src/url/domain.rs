use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_mapper::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs address the same host
///
/// Hosts are compared exactly (no `www.` folding, no subdomain matching) and
/// an explicit non-default port is part of the host, so two servers on the
/// same address but different ports are different sites. The scheme is not
/// compared: `http://example.com/a` and `https://example.com/b` share a host.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(ha), Some(hb)) => ha == hb && a.port() == b.port(),
        _ => false,
    }
}
