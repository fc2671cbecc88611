/// Thread-safe result store holding the three output tables
use crate::state::records::{FetchRecord, LinkRecord, PageOutcome, VisitRecord};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The fetch, visit and links tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTables {
    pub fetches: Vec<FetchRecord>,
    pub visits: Vec<VisitRecord>,
    pub links: Vec<LinkRecord>,
}

/// Row counts of the three tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub fetches: usize,
    pub visits: usize,
    pub links: usize,
}

/// Append-only store shared by all workers
///
/// A single mutex covers the three tables. Rows from different workers have
/// no defined order; rows from one page are always adjacent in each table.
#[derive(Debug, Default)]
pub struct ResultStore {
    tables: Mutex<ResultTables>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from tables restored out of a checkpoint
    pub fn from_tables(tables: ResultTables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// Appends all records for one claimed URL at once
    pub fn commit(&self, outcome: PageOutcome) {
        let mut tables = self.tables();
        tables.fetches.push(outcome.fetch);
        if let Some(visit) = outcome.visit {
            tables.visits.push(visit);
        }
        tables.links.extend(outcome.links);
    }

    /// Locks the tables for reading
    ///
    /// Checkpoints borrow the rows through this guard instead of cloning them.
    pub fn tables(&self) -> MutexGuard<'_, ResultTables> {
        // Rows are only ever appended whole, so a poisoned lock still holds valid tables
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn counts(&self) -> TableCounts {
        let tables = self.tables();
        TableCounts {
            fetches: tables.fetches.len(),
            visits: tables.visits.len(),
            links: tables.links.len(),
        }
    }

    /// Clones the current tables
    #[cfg(test)]
    pub fn snapshot(&self) -> ResultTables {
        self.tables().clone()
    }
}
