//! URL handling module for Shoal
//!
//! This module resolves raw hrefs against the page they were found on and
//! classifies the result as internal (`OK`) or external (`N_OK`) relative to
//! the crawled site.

mod domain;
mod matcher;

use crate::UrlError;
use std::fmt;
use std::str::FromStr;
use url::Url;

// Re-export main functions
pub use domain::{default_site_domain, extract_domain};
pub use matcher::matches_site;

/// Whether a discovered link belongs to the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkIndicator {
    /// Host is the site domain or one of its subdomains
    Ok,
    /// Anything else
    NotOk,
}

impl LinkIndicator {
    /// The label written to the links table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotOk => "N_OK",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for LinkIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkIndicator {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "OK" => Ok(Self::Ok),
            "N_OK" => Ok(Self::NotOk),
            other => Err(UrlError::Parse(format!("unknown link indicator '{}'", other))),
        }
    }
}

/// The set of hosts treated as part of the crawled site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    domain: String,
}

impl SiteScope {
    /// Creates a scope for `domain` and all of its subdomains
    ///
    /// A leading `*.` is accepted and ignored, since subdomains are always
    /// included.
    pub fn new(domain: &str) -> Self {
        let domain = domain.trim().to_lowercase();
        let domain = domain.strip_prefix("*.").unwrap_or(&domain).to_string();
        Self { domain }
    }

    /// Builds the scope from the root URL, preferring an explicit domain
    pub fn from_root(root_url: &str, site_domain: Option<&str>) -> Result<Self, UrlError> {
        if let Some(domain) = site_domain {
            return Ok(Self::new(domain));
        }

        let root = Url::parse(root_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let domain = default_site_domain(&root).ok_or(UrlError::MissingDomain)?;
        Ok(Self::new(&domain))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if the URL is an HTTP(S) URL on this site
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        extract_domain(url)
            .map(|host| matches_site(&self.domain, &host))
            .unwrap_or(false)
    }
}

/// A resolved, classified outbound link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLink {
    /// Absolute URL with the fragment removed
    pub url: Url,
    pub indicator: LinkIndicator,
}

/// Resolves a raw href against the page it appeared on
///
/// Relative references, dot segments and protocol-relative forms follow the
/// WHATWG URL rules. The fragment is dropped because it addresses the same
/// resource. Returns None only when the href cannot be resolved at all.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let mut resolved = base.join(href.trim()).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// Resolves and classifies one href found on `base`
///
/// # Examples
///
/// ```
/// use shoal::url::{classify_link, LinkIndicator, SiteScope};
/// use url::Url;
///
/// let scope = SiteScope::new("latimes.com");
/// let base = Url::parse("https://www.latimes.com/a/b").unwrap();
///
/// let link = classify_link(&base, "/c/d", &scope).unwrap();
/// assert_eq!(link.url.as_str(), "https://www.latimes.com/c/d");
/// assert_eq!(link.indicator, LinkIndicator::Ok);
///
/// let link = classify_link(&base, "https://external.example.com/x", &scope).unwrap();
/// assert_eq!(link.indicator, LinkIndicator::NotOk);
/// ```
pub fn classify_link(base: &Url, href: &str, scope: &SiteScope) -> Option<ClassifiedLink> {
    let url = resolve_href(base, href)?;
    let indicator = if scope.contains(&url) {
        LinkIndicator::Ok
    } else {
        LinkIndicator::NotOk
    };

    Some(ClassifiedLink { url, indicator })
}
