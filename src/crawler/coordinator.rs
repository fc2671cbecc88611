//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the orchestration around the worker pool, including:
//! - Loading or initializing the crawl state
//! - Building the shared context handed to every worker
//! - Checkpointing at intervals and at the end of the crawl
//! - Exporting the output tables

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::frontier::{Frontier, FrontierLimits, FrontierView};
use crate::crawler::worker::{run_worker, Processed};
use crate::output::export_tables;
use crate::state::{CrawlState, ResultStore, StateView};
use crate::storage::{CheckpointStore, SqliteCheckpointStore, StorageError, StorageResult};
use crate::url::SiteScope;
use crate::CrawlError;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// State shared by all workers of one crawl
pub struct CrawlContext<S> {
    pub(crate) frontier: Frontier,
    pub(crate) results: ResultStore,
    store: Mutex<S>,
    pub(crate) client: Client,
    pub(crate) scope: SiteScope,
    pub(crate) politeness_delay: Duration,
    pub(crate) allowed_types: HashSet<String>,
    config_hash: Option<String>,
    storage_failure: Mutex<Option<StorageError>>,
    started: Instant,
}

impl<S: CheckpointStore> CrawlContext<S> {
    fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Saves a checkpoint built from the frontier view and the result tables
    ///
    /// Called with the frontier lock held. Takes the results lock, then the
    /// store lock.
    fn save_checkpoint(&self, view: &FrontierView<'_>) -> StorageResult<()> {
        let tables = self.results.tables();
        let state = StateView {
            visited: view.visited,
            pending: view.pending.clone(),
            fetches: &tables.fetches,
            visits: &tables.visits,
            links: &tables.links,
            config_hash: self.config_hash.as_deref(),
        };

        self.store().save(&state)
    }

    /// Records what one URL produced and releases its claim
    pub(crate) fn finish_entry(&self, processed: Processed) {
        let Processed {
            outcome,
            discovered,
        } = processed;

        let saved = self.frontier.complete(discovered, |view| {
            self.results.commit(outcome);

            if !view.checkpoint_due {
                return None;
            }

            let elapsed = self.started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                view.completed as f64 / elapsed
            } else {
                0.0
            };
            tracing::info!(
                "Progress: {} visited, {} pending, {} in flight ({:.2} pages/sec)",
                view.visited.len(),
                view.pending.len(),
                view.in_flight,
                rate
            );

            Some(self.save_checkpoint(view))
        });

        if let Some(Err(e)) = saved {
            tracing::error!("Checkpoint failed, halting crawl: {}", e);
            self.record_storage_failure(e);
            self.frontier.halt();
        }
    }

    fn record_storage_failure(&self, error: StorageError) {
        let mut failure = self
            .storage_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            *failure = Some(error);
        }
    }

    fn take_storage_failure(&self) -> Option<StorageError> {
        self.storage_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Totals reported at the end of a crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    /// URLs claimed, across all sessions of this crawl
    pub visited: usize,
    pub fetches: usize,
    pub visits: usize,
    pub links: usize,
    /// Entries still pending when the crawl stopped
    pub pending: usize,
    /// Wall time of this session
    pub elapsed: Duration,
    /// True when the crawl was stopped early (interrupt or worker failure)
    pub halted: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: CheckpointStore = SqliteCheckpointStore> {
    config: Arc<Config>,
    context: Arc<CrawlContext<S>>,
}

impl Coordinator<SqliteCheckpointStore> {
    /// Creates a coordinator backed by the configured checkpoint file
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Whether to discard any saved checkpoint first
    pub fn new(config: Config, fresh: bool) -> Result<Self, CrawlError> {
        Self::open(config, fresh, None)
    }

    /// Like [`Coordinator::new`], recording `config_hash` in every checkpoint
    pub fn open(config: Config, fresh: bool, config_hash: Option<String>) -> Result<Self, CrawlError> {
        let store = SqliteCheckpointStore::new(Path::new(&config.output.checkpoint_path))?;
        Self::with_store(config, store, fresh, config_hash)
    }
}

impl<S> Coordinator<S>
where
    S: CheckpointStore + Send + 'static,
{
    /// Creates a coordinator over any checkpoint store
    ///
    /// Resumes from the store's last checkpoint unless `fresh` is set or
    /// nothing was saved yet.
    pub fn with_store(
        config: Config,
        mut store: S,
        fresh: bool,
        config_hash: Option<String>,
    ) -> Result<Self, CrawlError> {
        if fresh {
            tracing::info!("Starting fresh crawl, clearing previous checkpoint");
            store.clear()?;
        }

        let state = match store.load()? {
            Some(state) => {
                tracing::info!(
                    "Resuming crawl: {} visited, {} pending, {} fetches recorded",
                    state.visited.len(),
                    state.pending.len(),
                    state.fetches.len()
                );

                if let (Some(saved), Some(current)) = (&state.config_hash, &config_hash) {
                    if saved != current {
                        tracing::warn!(
                            "Configuration changed since the checkpoint was saved ({} -> {})",
                            saved,
                            current
                        );
                    }
                }

                let lost = state.unrecorded_claims();
                if !lost.is_empty() {
                    tracing::warn!(
                        "{} URLs were in flight when the crawl stopped and will not be retried",
                        lost.len()
                    );
                    for url in lost {
                        tracing::debug!("Lost in flight: {}", url);
                    }
                }

                state
            }
            None => {
                // Parsed form, so the seed matches links that point back at it
                let root = Url::parse(&config.crawler.root_url)?;
                tracing::info!("No checkpoint found, seeding frontier with {}", root);
                CrawlState::fresh(root.as_str())
            }
        };

        let crawler = &config.crawler;
        let limits = FrontierLimits {
            max_pages: crawler.max_pages,
            max_depth: crawler.max_depth,
            checkpoint_interval: crawler.checkpoint_interval,
            claim_timeout: crawler.claim_timeout(),
        };

        let frontier = Frontier::restore(&state.visited, &state.pending, limits);
        let results = ResultStore::from_tables(state.tables());
        let scope = SiteScope::from_root(&crawler.root_url, crawler.site_domain.as_deref())?;
        let client = build_http_client(&config.user_agent, crawler.request_timeout())?;

        tracing::info!("Site scope: {} (and subdomains)", scope.domain());

        let context = CrawlContext {
            frontier,
            results,
            store: Mutex::new(store),
            client,
            scope,
            politeness_delay: crawler.politeness_delay(),
            allowed_types: crawler
                .allowed_types
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
            config_hash,
            storage_failure: Mutex::new(None),
            started: Instant::now(),
        };

        Ok(Self {
            config: Arc::new(config),
            context: Arc::new(context),
        })
    }

    /// Shared context (frontier, result tables)
    pub fn context(&self) -> &CrawlContext<S> {
        &self.context
    }

    /// Halts the frontier; [`Coordinator::run`] returns once in-flight URLs finish
    pub fn stop(&self) {
        self.context.frontier.halt();
    }

    /// Runs the worker pool until the frontier drains
    ///
    /// Ctrl-C halts the frontier; workers finish their current URL and the
    /// final checkpoint is still written.
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        let worker_count = self.config.crawler.worker_count.max(1);
        tracing::info!("Starting crawl with {} workers", worker_count);

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            workers.spawn(run_worker(id, Arc::clone(&self.context)));
        }

        let mut interrupted = false;
        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        tracing::error!("Worker task failed: {}", e);
                        self.context.frontier.halt();
                    }
                    None => break,
                },
                signal = tokio::signal::ctrl_c(), if !interrupted => {
                    interrupted = true;
                    match signal {
                        Ok(()) => {
                            tracing::warn!("Interrupted, finishing in-flight URLs");
                            self.context.frontier.halt();
                        }
                        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
                    }
                }
            }
        }

        let ctx = &self.context;

        if let Some(e) = ctx.take_storage_failure() {
            tracing::error!("Crawl stopped by a checkpoint failure; keeping last good checkpoint");
            self.export()?;
            return Err(e.into());
        }

        ctx.frontier
            .snapshot_with(|view| ctx.save_checkpoint(view))?;
        tracing::info!("Final checkpoint saved");

        self.export()?;

        let stats = ctx.frontier.stats();
        let counts = ctx.results.counts();
        let summary = CrawlSummary {
            visited: stats.visited,
            fetches: counts.fetches,
            visits: counts.visits,
            links: counts.links,
            pending: stats.pending,
            elapsed: ctx.started.elapsed(),
            halted: ctx.frontier.is_halted(),
        };

        tracing::info!(
            "Crawl finished: {} visited, {} fetches, {} visits, {} links in {:.1}s",
            summary.visited,
            summary.fetches,
            summary.visits,
            summary.links,
            summary.elapsed.as_secs_f64()
        );

        Ok(summary)
    }

    fn export(&self) -> Result<(), CrawlError> {
        let tables = self.context.results.tables();
        export_tables(&self.config.output, &tables)?;
        tracing::info!(
            "Exported tables to {}",
            Path::new(&self.config.output.directory).display()
        );
        Ok(())
    }
}

/// Runs a complete crawl against the configured checkpoint file
///
/// # Example
///
/// ```no_run
/// use shoal::config::load_config;
/// use shoal::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let summary = run_crawl(config, false).await?;
/// println!("visited {} pages", summary.visited);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlSummary, CrawlError> {
    let coordinator = Coordinator::new(config, fresh)?;
    coordinator.run().await
}
