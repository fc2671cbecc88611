//! Storage module for crawl checkpoints
//!
//! This module handles persistence of the resumable crawl state:
//! - SQLite database initialization and schema management
//! - Atomic, incremental checkpoint saves
//! - Loading and version checking on resume

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCheckpointStore;
pub use traits::{CheckpointStore, StorageError, StorageResult};
