//! Output error types and the crawl report model

use crate::state::{FetchStatus, ResultTables};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while exporting or reading output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed table {table}: {message}")]
    Malformed { table: String, message: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;

/// File size ranges used in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeBucket {
    UnderOneKb,
    UnderTenKb,
    UnderHundredKb,
    UnderOneMb,
    OneMbOrMore,
}

impl SizeBucket {
    pub fn for_size(bytes: u64) -> Self {
        match bytes {
            b if b < KB => Self::UnderOneKb,
            b if b < 10 * KB => Self::UnderTenKb,
            b if b < 100 * KB => Self::UnderHundredKb,
            b if b < MB => Self::UnderOneMb,
            _ => Self::OneMbOrMore,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UnderOneKb => "< 1KB",
            Self::UnderTenKb => "1KB ~ <10KB",
            Self::UnderHundredKb => "10KB ~ <100KB",
            Self::UnderOneMb => "100KB ~ <1MB",
            Self::OneMbOrMore => ">= 1MB",
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status label with its reason phrase for the common codes
pub fn status_label(status: &FetchStatus) -> String {
    match status {
        FetchStatus::Code(200) => "200 OK".to_string(),
        FetchStatus::Code(301) => "301 Moved Permanently".to_string(),
        FetchStatus::Code(401) => "401 Unauthorized".to_string(),
        FetchStatus::Code(403) => "403 Forbidden".to_string(),
        FetchStatus::Code(404) => "404 Not Found".to_string(),
        other => other.to_string(),
    }
}

/// Aggregated view of the three output tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlReport {
    /// Site domain the crawl was scoped to
    pub site: String,
    pub worker_count: usize,

    pub fetches_attempted: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,

    pub urls_extracted: u64,
    pub unique_urls: u64,
    pub unique_within: u64,
    pub unique_outside: u64,

    /// Fetch count per status, ordered by status
    pub status_counts: BTreeMap<FetchStatus, u64>,
    /// Visit count per size range; only non-empty ranges are present
    pub size_buckets: BTreeMap<SizeBucket, u64>,
    /// Visit count per content type, most common first
    pub content_types: Vec<(String, u64)>,
}

impl CrawlReport {
    /// Tallies the output tables
    pub fn from_tables(tables: &ResultTables, site: &str, worker_count: usize) -> Self {
        let mut report = Self {
            site: site.to_string(),
            worker_count,
            ..Self::default()
        };

        for fetch in &tables.fetches {
            report.fetches_attempted += 1;
            *report.status_counts.entry(fetch.status).or_insert(0) += 1;
        }
        report.fetches_succeeded = report
            .status_counts
            .get(&FetchStatus::Code(200))
            .copied()
            .unwrap_or(0);
        report.fetches_failed = report.fetches_attempted - report.fetches_succeeded;

        let mut content_types: HashMap<String, u64> = HashMap::new();
        for visit in &tables.visits {
            *report
                .size_buckets
                .entry(SizeBucket::for_size(visit.byte_size))
                .or_insert(0) += 1;
            *content_types.entry(visit.content_type.clone()).or_insert(0) += 1;
        }
        report.content_types = content_types.into_iter().collect();
        report
            .content_types
            .sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut all = HashSet::new();
        let mut within = HashSet::new();
        let mut outside = HashSet::new();
        for link in &tables.links {
            report.urls_extracted += 1;
            all.insert(link.url.as_str());
            if link.indicator.is_internal() {
                within.insert(link.url.as_str());
            } else {
                outside.insert(link.url.as_str());
            }
        }
        report.unique_urls = all.len() as u64;
        report.unique_within = within.len() as u64;
        report.unique_outside = outside.len() as u64;

        report
    }

    /// Percentage of attempted fetches that returned 200
    pub fn success_rate(&self) -> f64 {
        if self.fetches_attempted == 0 {
            0.0
        } else {
            (self.fetches_succeeded as f64 / self.fetches_attempted as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FetchRecord, LinkRecord, VisitRecord};
    use crate::url::LinkIndicator;

    fn fetch(url: &str, status: FetchStatus) -> FetchRecord {
        FetchRecord {
            url: url.to_string(),
            status,
        }
    }

    fn visit(url: &str, size: u64, content_type: &str) -> VisitRecord {
        VisitRecord {
            url: url.to_string(),
            byte_size: size,
            outlink_count: 0,
            content_type: content_type.to_string(),
        }
    }

    fn link(url: &str, indicator: LinkIndicator) -> LinkRecord {
        LinkRecord {
            url: url.to_string(),
            indicator,
        }
    }

    #[test]
    fn test_size_buckets() {
        assert_eq!(SizeBucket::for_size(0), SizeBucket::UnderOneKb);
        assert_eq!(SizeBucket::for_size(1023), SizeBucket::UnderOneKb);
        assert_eq!(SizeBucket::for_size(1024), SizeBucket::UnderTenKb);
        assert_eq!(SizeBucket::for_size(100 * 1024), SizeBucket::UnderOneMb);
        assert_eq!(SizeBucket::for_size(1024 * 1024), SizeBucket::OneMbOrMore);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(&FetchStatus::Code(200)), "200 OK");
        assert_eq!(status_label(&FetchStatus::Code(404)), "404 Not Found");
        assert_eq!(status_label(&FetchStatus::Code(500)), "500");
        assert_eq!(status_label(&FetchStatus::Error), "Error");
    }

    #[test]
    fn test_report_from_tables() {
        let tables = ResultTables {
            fetches: vec![
                fetch("https://a.com/", FetchStatus::Code(200)),
                fetch("https://a.com/doc.pdf", FetchStatus::Code(200)),
                fetch("https://a.com/gone", FetchStatus::Code(404)),
                fetch("https://a.com/slow", FetchStatus::Error),
            ],
            visits: vec![
                visit("https://a.com/", 2048, "text/html"),
                visit("https://a.com/doc.pdf", 2 * 1024 * 1024, "application/pdf"),
            ],
            links: vec![
                link("https://a.com/doc.pdf", LinkIndicator::Ok),
                link("https://a.com/gone", LinkIndicator::Ok),
                link("https://b.org/", LinkIndicator::NotOk),
                link("https://a.com/gone", LinkIndicator::Ok),
            ],
        };

        let report = CrawlReport::from_tables(&tables, "a.com", 8);

        assert_eq!(report.fetches_attempted, 4);
        assert_eq!(report.fetches_succeeded, 2);
        assert_eq!(report.fetches_failed, 2);
        assert_eq!(report.urls_extracted, 4);
        assert_eq!(report.unique_urls, 3);
        assert_eq!(report.unique_within, 2);
        assert_eq!(report.unique_outside, 1);
        assert_eq!(report.status_counts.get(&FetchStatus::Error), Some(&1));
        assert_eq!(report.size_buckets.len(), 2);
        assert_eq!(report.size_buckets.get(&SizeBucket::OneMbOrMore), Some(&1));
        assert_eq!(report.success_rate(), 50.0);
    }

    #[test]
    fn test_empty_report() {
        let report = CrawlReport::from_tables(&ResultTables::default(), "a.com", 1);
        assert_eq!(report.fetches_attempted, 0);
        assert_eq!(report.success_rate(), 0.0);
        assert!(report.size_buckets.is_empty());
    }
}
