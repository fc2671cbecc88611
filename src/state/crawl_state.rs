//! The recoverable crawl state
//!
//! `CrawlState` is the owned form loaded from a checkpoint. `StateView` is the
//! borrowed form handed to the checkpoint store while the frontier lock is
//! held, so saving never copies the tables.

use crate::state::records::{FetchRecord, FrontierEntry, LinkRecord, VisitRecord};
use crate::state::results::ResultTables;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Version of the persisted state layout; bump when fields change
pub const CRAWL_STATE_VERSION: u32 = 1;

/// Everything needed to resume a crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlState {
    /// Claimed URLs, in claim order
    pub visited: Vec<String>,
    /// Entries offered but not yet claimed
    pub pending: Vec<FrontierEntry>,
    pub fetches: Vec<FetchRecord>,
    pub visits: Vec<VisitRecord>,
    pub links: Vec<LinkRecord>,
    /// Hash of the configuration the state was produced under
    pub config_hash: Option<String>,
    /// When the snapshot was written (set by the store)
    pub saved_at: Option<DateTime<Utc>>,
}

impl CrawlState {
    /// A new crawl: the root URL is the only frontier entry, at depth 0
    pub fn fresh(root_url: &str) -> Self {
        Self {
            pending: vec![FrontierEntry::new(root_url, 0)],
            ..Self::default()
        }
    }

    pub fn view(&self) -> StateView<'_> {
        StateView {
            visited: &self.visited,
            pending: self.pending.iter().collect(),
            fetches: &self.fetches,
            visits: &self.visits,
            links: &self.links,
            config_hash: self.config_hash.as_deref(),
        }
    }

    pub fn tables(&self) -> ResultTables {
        ResultTables {
            fetches: self.fetches.clone(),
            visits: self.visits.clone(),
            links: self.links.clone(),
        }
    }

    /// URLs claimed before the snapshot whose fetch never got recorded
    ///
    /// These were in flight when the process stopped. They stay visited and
    /// are not retried.
    pub fn unrecorded_claims(&self) -> Vec<&str> {
        let fetched: HashSet<&str> = self.fetches.iter().map(|f| f.url.as_str()).collect();
        self.visited
            .iter()
            .map(String::as_str)
            .filter(|url| !fetched.contains(url))
            .collect()
    }
}

/// Borrowed snapshot of the crawl state, consistent at one lock boundary
#[derive(Debug, Clone)]
pub struct StateView<'a> {
    pub visited: &'a [String],
    pub pending: Vec<&'a FrontierEntry>,
    pub fetches: &'a [FetchRecord],
    pub visits: &'a [VisitRecord],
    pub links: &'a [LinkRecord],
    pub config_hash: Option<&'a str>,
}
