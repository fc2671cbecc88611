//! Crawl state
//!
//! Records produced by the workers, the shared result store that collects
//! them, and the checkpoint payload built from both.

mod crawl_state;
mod records;
mod results;

pub use crawl_state::{CrawlState, StateView, CRAWL_STATE_VERSION};
pub use records::{
    FetchRecord, FetchStatus, FrontierEntry, InvalidStatus, LinkRecord, PageOutcome, VisitRecord,
};
pub use results::{ResultStore, ResultTables, TableCounts};
