//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::state::{CrawlState, StateView};
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported checkpoint version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Corrupt checkpoint: {0}")]
    Corrupt(String),

    #[error("Checkpoint is ahead of the crawl state: {0}")]
    Inconsistent(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backend implementations
///
/// A save must be atomic: after a failure the previously saved state is
/// still the one `load` returns.
pub trait CheckpointStore {
    /// Persists a snapshot of the crawl
    ///
    /// The tables in `view` only ever grow between saves of the same crawl,
    /// so implementations may append the rows they have not seen yet.
    fn save(&mut self, view: &StateView<'_>) -> StorageResult<()>;

    /// Loads the last saved snapshot, or None if nothing was saved
    fn load(&self) -> StorageResult<Option<CrawlState>>;

    /// Discards any saved snapshot
    fn clear(&mut self) -> StorageResult<()>;
}
