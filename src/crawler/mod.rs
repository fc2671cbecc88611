//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared BFS frontier with atomic claims
//! - HTTP fetching with a bounded timeout
//! - HTML link extraction
//! - The worker pool and overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod worker;

pub use coordinator::{run_crawl, Coordinator, CrawlContext, CrawlSummary};
pub use fetcher::{build_http_client, fetch_url, media_type, FetchError, FetchResponse};
pub use frontier::{Claim, Frontier, FrontierLimits, FrontierStats, FrontierView};
pub use parser::{collect_links, extract_hrefs};
