//! Crawl worker loop
//!
//! Each worker claims one URL at a time, fetches it, turns the response into
//! records and reports completion to the frontier. No per-URL failure stops
//! a worker; only a drained or halted frontier does.

use crate::crawler::coordinator::CrawlContext;
use crate::crawler::fetcher::fetch_url;
use crate::crawler::frontier::Claim;
use crate::crawler::parser::collect_links;
use crate::state::{
    FetchRecord, FetchStatus, FrontierEntry, LinkRecord, PageOutcome, VisitRecord,
};
use crate::storage::CheckpointStore;
use std::sync::Arc;
use url::Url;

const HTML_MEDIA_TYPE: &str = "text/html";

/// What processing one URL produced
pub(crate) struct Processed {
    pub outcome: PageOutcome,
    /// Internal links to offer at the next depth
    pub discovered: Vec<FrontierEntry>,
}

impl Processed {
    fn fetch_only(url: &str, status: FetchStatus) -> Self {
        Self {
            outcome: PageOutcome::fetch_only(url, status),
            discovered: Vec::new(),
        }
    }
}

/// Runs one worker until the frontier drains
pub(crate) async fn run_worker<S>(id: usize, ctx: Arc<CrawlContext<S>>)
where
    S: CheckpointStore + Send + 'static,
{
    tracing::debug!("Worker {} started", id);
    let mut processed = 0u64;

    loop {
        let entry = match ctx.frontier.claim().await {
            Claim::Entry(entry) => entry,
            Claim::Drained => break,
        };

        tracing::debug!("Worker {} claimed {} (depth {})", id, entry.url, entry.depth);

        let result = process_entry(&ctx, &entry).await;
        ctx.finish_entry(result);
        processed += 1;

        let delay = ctx.politeness_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::debug!("Worker {} finished after {} URLs", id, processed);
}

/// Fetches one claimed URL and builds its records
pub(crate) async fn process_entry<S>(ctx: &CrawlContext<S>, entry: &FrontierEntry) -> Processed
where
    S: CheckpointStore,
{
    let response = match fetch_url(&ctx.client, &entry.url).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Fetch failed for {}: {}", entry.url, e);
            return Processed::fetch_only(&entry.url, FetchStatus::Error);
        }
    };

    let status = FetchStatus::Code(response.status);
    if !status.is_success() {
        tracing::debug!("{} returned {}", entry.url, response.status);
        return Processed::fetch_only(&entry.url, status);
    }

    let content_type = response.media_type();

    if content_type == HTML_MEDIA_TYPE {
        let html = String::from_utf8_lossy(&response.body);
        let links = match Url::parse(&entry.url) {
            Ok(base) => collect_links(&base, &html, &ctx.scope),
            Err(e) => {
                tracing::warn!("Cannot resolve links on {}: {}", entry.url, e);
                Vec::new()
            }
        };

        if links.is_empty() {
            tracing::warn!("No outlinks found on {}", entry.url);
        }

        let discovered = links
            .iter()
            .filter(|link| link.indicator.is_internal())
            .map(|link| FrontierEntry::new(link.url.as_str(), entry.depth + 1))
            .collect();

        let visit = VisitRecord {
            url: entry.url.clone(),
            byte_size: response.body.len() as u64,
            outlink_count: links.len() as u64,
            content_type,
        };

        let links = links
            .into_iter()
            .map(|link| LinkRecord {
                url: link.url.to_string(),
                indicator: link.indicator,
            })
            .collect();

        return Processed {
            outcome: PageOutcome {
                fetch: success_fetch(&entry.url),
                visit: Some(visit),
                links,
            },
            discovered,
        };
    }

    if ctx.allowed_types.contains(&content_type) {
        return Processed {
            outcome: PageOutcome {
                fetch: success_fetch(&entry.url),
                visit: Some(VisitRecord {
                    url: entry.url.clone(),
                    byte_size: response.body.len() as u64,
                    outlink_count: 0,
                    content_type,
                }),
                links: Vec::new(),
            },
            discovered: Vec::new(),
        };
    }

    tracing::debug!("Not recording content type '{}' for {}", content_type, entry.url);
    Processed::fetch_only(&entry.url, status)
}

fn success_fetch(url: &str) -> FetchRecord {
    FetchRecord {
        url: url.to_string(),
        status: FetchStatus::Code(200),
    }
}
