/// Crawl records: frontier entries and the three output tables
use crate::url::LinkIndicator;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A URL waiting in the frontier, with its link distance from the root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Outcome of one fetch attempt as written to the fetch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchStatus {
    /// The server answered with this HTTP status code
    Code(u16),
    /// Transport failure (timeout, DNS, connection, body read)
    Error,
}

impl FetchStatus {
    /// Only a 200 response counts as a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Code(200))
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Error => f.write_str("Error"),
        }
    }
}

/// A fetch table status that is neither a status code nor `Error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fetch status '{0}'")]
pub struct InvalidStatus(pub String);

impl FromStr for FetchStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "Error" {
            return Ok(Self::Error);
        }

        s.parse::<u16>()
            .map(Self::Code)
            .map_err(|_| InvalidStatus(s.to_string()))
    }
}

/// One row of the fetch table, appended once per attempted URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    pub url: String,
    pub status: FetchStatus,
}

/// One row of the visit table, appended for 200 responses of an allowed type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub url: String,
    pub byte_size: u64,
    pub outlink_count: u64,
    pub content_type: String,
}

/// One row of the links table, appended once per distinct outbound link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub url: String,
    pub indicator: LinkIndicator,
}

/// Everything recorded for a single claimed URL
///
/// The records are committed to the result store together so a checkpoint
/// never holds half of a page's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub fetch: FetchRecord,
    pub visit: Option<VisitRecord>,
    pub links: Vec<LinkRecord>,
}

impl PageOutcome {
    /// A fetch that produced no visit and no links
    pub fn fetch_only(url: &str, status: FetchStatus) -> Self {
        Self {
            fetch: FetchRecord {
                url: url.to_string(),
                status,
            },
            visit: None,
            links: Vec::new(),
        }
    }
}
