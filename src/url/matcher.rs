/// Checks whether a host belongs to a site domain
///
/// The host matches when it equals the domain or is any subdomain of it:
/// "example.com" covers "example.com", "www.example.com" and
/// "api.v2.example.com", but not "myexample.com".
///
/// Both arguments are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use shoal::url::matches_site;
///
/// assert!(matches_site("example.com", "example.com"));
/// assert!(matches_site("example.com", "blog.example.com"));
/// assert!(!matches_site("example.com", "example.org"));
/// assert!(!matches_site("example.com", "myexample.com"));
/// ```
pub fn matches_site(domain: &str, host: &str) -> bool {
    if domain.is_empty() || host.is_empty() {
        return false;
    }

    match host.strip_suffix(domain) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_site("example.com", "example.com"));
        assert!(matches_site("127.0.0.1", "127.0.0.1"));
    }

    #[test]
    fn test_subdomains() {
        assert!(matches_site("example.com", "www.example.com"));
        assert!(matches_site("example.com", "api.v2.example.com"));
        assert!(matches_site("latimes.com", "sports.latimes.com"));
    }

    #[test]
    fn test_no_match_different_domain() {
        assert!(!matches_site("example.com", "example.org"));
        assert!(!matches_site("example.com", "other.com"));
    }

    #[test]
    fn test_no_match_partial() {
        assert!(!matches_site("example.com", "myexample.com"));
        assert!(!matches_site("example.com", "example.com.org"));
        assert!(!matches_site("www.example.com", "example.com"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(!matches_site("example.com", ""));
        assert!(!matches_site("", "example.com"));
        assert!(!matches_site("", ""));
    }

    #[test]
    fn test_multiple_dots_in_base() {
        assert!(matches_site("co.uk", "example.co.uk"));
        assert!(!matches_site("example.co.uk", "co.uk"));
    }
}
