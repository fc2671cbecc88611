//! HTML parser for extracting links
//!
//! Only `<a href="...">` elements are considered. Raw href values are
//! returned untouched; resolution and classification happen in the url
//! module.

use crate::url::{classify_link, ClassifiedLink, SiteScope};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the raw `href` value of every `<a>` element, in document order
///
/// # Example
///
/// ```
/// use shoal::crawler::extract_hrefs;
///
/// let html = r#"<html><body><a href="/page">Link</a><a>None</a></body></html>"#;
/// assert_eq!(extract_hrefs(html), vec!["/page".to_string()]);
/// ```
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Resolves and classifies every link on a page, one per distinct target
///
/// Hrefs that cannot be resolved are skipped. The first occurrence of each
/// resolved URL wins, so the result keeps document order.
pub fn collect_links(base: &Url, html: &str, scope: &SiteScope) -> Vec<ClassifiedLink> {
    let mut seen = HashSet::new();

    extract_hrefs(html)
        .iter()
        .filter_map(|href| classify_link(base, href, scope))
        .filter(|link| seen.insert(link.url.as_str().to_string()))
        .collect()
}
