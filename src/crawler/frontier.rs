//! Shared crawl frontier
//!
//! The frontier owns the FIFO queue of pending entries, the visited set and
//! the in-flight accounting. A single mutex guards all of it, so claiming a
//! URL (visited test-and-insert plus budget check) is atomic with respect to
//! every other claim and offer.
//!
//! Workers that find the queue empty wait on a `Notify` with a bounded
//! timeout. The frontier reports `Drained` once the queue holds nothing
//! claimable and no claimed URL is still being processed, since only an
//! in-flight URL could refill the queue.

use crate::state::FrontierEntry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Result of asking the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A URL reserved for the calling worker
    Entry(FrontierEntry),
    /// No more work will ever become available
    Drained,
}

/// Limits enforced by the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierLimits {
    /// Maximum number of URLs ever claimed
    pub max_pages: usize,
    /// Entries deeper than this are never claimed
    pub max_depth: u32,
    /// A checkpoint is due every this many completed URLs
    pub checkpoint_interval: u64,
    /// Bounded wait per claim round
    pub claim_timeout: Duration,
}

/// Borrowed view of the frontier, taken under its lock
#[derive(Debug)]
pub struct FrontierView<'a> {
    /// Claimed URLs in claim order
    pub visited: &'a [String],
    /// Pending entries in queue order
    pub pending: Vec<&'a FrontierEntry>,
    pub completed: u64,
    pub in_flight: usize,
    /// True when this completion crossed a checkpoint interval
    pub checkpoint_due: bool,
}

/// Counters for progress reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    pub visited: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub completed: u64,
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<FrontierEntry>,
    /// Smallest pending depth per queued URL
    queued: HashMap<String, u32>,
    visited: HashSet<String>,
    visit_log: Vec<String>,
    in_flight: usize,
    completed: u64,
    halted: bool,
}

impl FrontierInner {
    fn budget_exhausted(&self, max_pages: usize) -> bool {
        self.visited.len() >= max_pages
    }

    /// Queues an entry unless it is visited or already pending at the same or
    /// a smaller depth
    fn enqueue(&mut self, entry: FrontierEntry) -> bool {
        if self.visited.contains(&entry.url) {
            return false;
        }

        match self.queued.get(&entry.url) {
            Some(&depth) if depth <= entry.depth => return false,
            _ => {}
        }

        self.queued.insert(entry.url.clone(), entry.depth);
        self.queue.push_back(entry);
        true
    }

    /// Pops entries until one can be claimed, reserving it
    fn reserve_next(&mut self, limits: &FrontierLimits) -> Option<FrontierEntry> {
        while let Some(entry) = self.queue.pop_front() {
            match self.queued.get(&entry.url) {
                // Superseded by a shallower copy still in the queue
                Some(&depth) if depth < entry.depth => continue,
                Some(&depth) if depth == entry.depth => {
                    self.queued.remove(&entry.url);
                }
                _ => {}
            }

            if entry.depth > limits.max_depth {
                tracing::trace!("Dropping {} at depth {}", entry.url, entry.depth);
                continue;
            }

            if self.budget_exhausted(limits.max_pages) || self.visited.contains(&entry.url) {
                continue;
            }

            self.visited.insert(entry.url.clone());
            self.visit_log.push(entry.url.clone());
            self.in_flight += 1;
            return Some(entry);
        }

        None
    }

    fn pending(&self) -> Vec<&FrontierEntry> {
        self.queue
            .iter()
            .filter(|entry| self.queued.get(&entry.url) == Some(&entry.depth))
            .collect()
    }

    fn view(&self, checkpoint_due: bool) -> FrontierView<'_> {
        FrontierView {
            visited: &self.visit_log,
            pending: self.pending(),
            completed: self.completed,
            in_flight: self.in_flight,
            checkpoint_due,
        }
    }
}

/// The shared BFS frontier
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    notify: Notify,
    limits: FrontierLimits,
}

impl Frontier {
    /// Creates a frontier seeded with a single root entry at depth 0
    pub fn new(root_url: &str, limits: FrontierLimits) -> Self {
        Self::restore(&[], &[FrontierEntry::new(root_url, 0)], limits)
    }

    /// Rebuilds a frontier from a checkpoint
    ///
    /// Every restored visited URL counts as completed. Pending entries are
    /// re-queued in their saved order.
    pub fn restore(visited: &[String], pending: &[FrontierEntry], limits: FrontierLimits) -> Self {
        let mut inner = FrontierInner {
            visited: visited.iter().cloned().collect(),
            visit_log: visited.to_vec(),
            completed: visited.len() as u64,
            ..FrontierInner::default()
        };

        for entry in pending {
            inner.enqueue(entry.clone());
        }

        Self {
            inner: Mutex::new(inner),
            notify: Notify::new(),
            limits,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // Every critical section leaves the counters consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn limits(&self) -> &FrontierLimits {
        &self.limits
    }

    /// Waits for a claimable entry and reserves it
    ///
    /// The entry's URL is in the visited set and counted as in flight when
    /// this returns. The caller must report it through [`Frontier::complete`].
    pub async fn claim(&self) -> Claim {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between check and wait is kept
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if inner.halted || inner.budget_exhausted(self.limits.max_pages) {
                    return Claim::Drained;
                }

                if let Some(entry) = inner.reserve_next(&self.limits) {
                    return Claim::Entry(entry);
                }

                if inner.in_flight == 0 {
                    return Claim::Drained;
                }
            }

            let _ = tokio::time::timeout(self.limits.claim_timeout, notified).await;
        }
    }

    /// Offers a newly discovered entry
    ///
    /// Refused when the URL is already visited, already pending at the same
    /// or a smaller depth, or the page budget is spent.
    pub fn offer(&self, entry: FrontierEntry) -> bool {
        let accepted = {
            let mut inner = self.lock();
            !inner.budget_exhausted(self.limits.max_pages) && inner.enqueue(entry)
        };

        if accepted {
            self.notify.notify_waiters();
        }
        accepted
    }

    /// Marks one claimed URL as finished
    ///
    /// `discovered` entries are offered first, then `on_complete` runs with a
    /// view of the updated frontier while the lock is still held. Everything a
    /// URL produces therefore becomes visible to a checkpoint at once.
    pub fn complete<T>(
        &self,
        discovered: Vec<FrontierEntry>,
        on_complete: impl FnOnce(&FrontierView<'_>) -> T,
    ) -> T {
        let result = {
            let mut inner = self.lock();

            let mut accepted = 0usize;
            for entry in discovered {
                if inner.budget_exhausted(self.limits.max_pages) {
                    break;
                }
                if inner.enqueue(entry) {
                    accepted += 1;
                }
            }
            if accepted > 0 {
                tracing::trace!("Queued {} new entries", accepted);
            }

            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.completed += 1;

            let checkpoint_due = inner.completed % self.limits.checkpoint_interval.max(1) == 0;
            on_complete(&inner.view(checkpoint_due))
        };

        self.notify.notify_waiters();
        result
    }

    /// Runs `f` with a consistent view of the frontier
    pub fn snapshot_with<T>(&self, f: impl FnOnce(&FrontierView<'_>) -> T) -> T {
        let inner = self.lock();
        f(&inner.view(false))
    }

    /// Stops the crawl: every later claim returns `Drained`
    pub fn halt(&self) {
        self.lock().halted = true;
        self.notify.notify_waiters();
    }

    pub fn is_halted(&self) -> bool {
        self.lock().halted
    }

    pub fn stats(&self) -> FrontierStats {
        let inner = self.lock();
        FrontierStats {
            visited: inner.visited.len(),
            pending: inner.queued.len(),
            in_flight: inner.in_flight,
            completed: inner.completed,
        }
    }
}
