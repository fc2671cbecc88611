use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shoal::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the site domain from the crawl's root URL
///
/// The host is lowercased and a leading `www.` is removed, so that a crawl
/// rooted at `https://www.example.com` treats `example.com` and every other
/// subdomain as internal.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shoal::url::default_site_domain;
///
/// let url = Url::parse("https://www.latimes.com").unwrap();
/// assert_eq!(default_site_domain(&url), Some("latimes.com".to_string()));
/// ```
pub fn default_site_domain(root: &Url) -> Option<String> {
    let host = extract_domain(root)?;
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => Some(rest.to_string()),
        _ => Some(host),
    }
}
