//! SQLite checkpoint store
//!
//! This module provides a SQLite-based implementation of the CheckpointStore
//! trait. Each save runs in one transaction, so an interrupted save leaves
//! the previous checkpoint intact.

use crate::state::{
    CrawlState, FetchRecord, FetchStatus, FrontierEntry, LinkRecord, StateView, VisitRecord,
    CRAWL_STATE_VERSION,
};
use crate::storage::schema::{initialize_schema, CHECKPOINT_TABLES};
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::url::LinkIndicator;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const META_VERSION: &str = "state_version";
const META_SAVED_AT: &str = "saved_at";
const META_CONFIG_HASH: &str = "config_hash";

/// SQLite checkpoint backend
pub struct SqliteCheckpointStore {
    conn: Connection,
}

impl SqliteCheckpointStore {
    /// Opens or creates a checkpoint database
    ///
    /// Missing parent directories are created.
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn read_meta(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn load_visited(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM visited ORDER BY seq")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(urls)
    }

    fn load_frontier(&self) -> StorageResult<Vec<FrontierEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, depth FROM frontier ORDER BY seq")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, depth)| {
                let depth = u32::try_from(depth)
                    .map_err(|_| corrupt_column("frontier.depth", depth))?;
                Ok(FrontierEntry { url, depth })
            })
            .collect()
    }

    fn load_fetches(&self) -> StorageResult<Vec<FetchRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, status FROM fetches ORDER BY seq")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, status)| {
                let status = status
                    .parse::<FetchStatus>()
                    .map_err(|e| StorageError::Corrupt(e.to_string()))?;
                Ok(FetchRecord { url, status })
            })
            .collect()
    }

    fn load_visits(&self) -> StorageResult<Vec<VisitRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, byte_size, outlink_count, content_type FROM visits ORDER BY seq",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, byte_size, outlink_count, content_type)| {
                Ok(VisitRecord {
                    url,
                    byte_size: u64::try_from(byte_size)
                        .map_err(|_| corrupt_column("visits.byte_size", byte_size))?,
                    outlink_count: u64::try_from(outlink_count)
                        .map_err(|_| corrupt_column("visits.outlink_count", outlink_count))?,
                    content_type,
                })
            })
            .collect()
    }

    fn load_links(&self) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, indicator FROM links ORDER BY seq")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, indicator)| {
                let indicator = indicator
                    .parse::<LinkIndicator>()
                    .map_err(|e| StorageError::Corrupt(e.to_string()))?;
                Ok(LinkRecord { url, indicator })
            })
            .collect()
    }
}

fn corrupt_column(column: &str, value: i64) -> StorageError {
    StorageError::Corrupt(format!("{} holds out of range value {}", column, value))
}

/// Number of rows already persisted in `table`
///
/// Fails when the database holds more rows than the in-memory table, which
/// means the checkpoint belongs to a different crawl.
fn persisted_rows(conn: &Connection, table: &str, in_memory: usize) -> StorageResult<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    let count = count as usize;

    if count > in_memory {
        return Err(StorageError::Inconsistent(format!(
            "{} has {} saved rows but only {} in memory",
            table, count, in_memory
        )));
    }

    Ok(count)
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

impl CheckpointStore for SqliteCheckpointStore {
    fn save(&mut self, view: &StateView<'_>) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        let start = persisted_rows(&tx, "visited", view.visited.len())?;
        {
            let mut stmt = tx.prepare("INSERT INTO visited (seq, url) VALUES (?1, ?2)")?;
            for (seq, url) in view.visited.iter().enumerate().skip(start) {
                stmt.execute(params![seq as i64, url])?;
            }
        }

        tx.execute("DELETE FROM frontier", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO frontier (seq, url, depth) VALUES (?1, ?2, ?3)")?;
            for (seq, entry) in view.pending.iter().enumerate() {
                stmt.execute(params![seq as i64, entry.url, entry.depth as i64])?;
            }
        }

        let start = persisted_rows(&tx, "fetches", view.fetches.len())?;
        {
            let mut stmt = tx.prepare("INSERT INTO fetches (seq, url, status) VALUES (?1, ?2, ?3)")?;
            for (seq, fetch) in view.fetches.iter().enumerate().skip(start) {
                stmt.execute(params![seq as i64, fetch.url, fetch.status.to_string()])?;
            }
        }

        let start = persisted_rows(&tx, "visits", view.visits.len())?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO visits (seq, url, byte_size, outlink_count, content_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, visit) in view.visits.iter().enumerate().skip(start) {
                stmt.execute(params![
                    seq as i64,
                    visit.url,
                    visit.byte_size as i64,
                    visit.outlink_count as i64,
                    visit.content_type
                ])?;
            }
        }

        let start = persisted_rows(&tx, "links", view.links.len())?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO links (seq, url, indicator) VALUES (?1, ?2, ?3)")?;
            for (seq, link) in view.links.iter().enumerate().skip(start) {
                stmt.execute(params![seq as i64, link.url, link.indicator.as_str()])?;
            }
        }

        write_meta(&tx, META_VERSION, &CRAWL_STATE_VERSION.to_string())?;
        write_meta(&tx, META_SAVED_AT, &Utc::now().to_rfc3339())?;
        match view.config_hash {
            Some(hash) => write_meta(&tx, META_CONFIG_HASH, hash)?,
            None => {
                tx.execute("DELETE FROM meta WHERE key = ?1", params![META_CONFIG_HASH])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> StorageResult<Option<CrawlState>> {
        let version = match self.read_meta(META_VERSION)? {
            Some(version) => version,
            None => return Ok(None),
        };

        let found = version
            .parse::<u32>()
            .map_err(|_| StorageError::Corrupt(format!("invalid state version '{}'", version)))?;
        if found != CRAWL_STATE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found,
                expected: CRAWL_STATE_VERSION,
            });
        }

        let saved_at = self
            .read_meta(META_SAVED_AT)?
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Ok(Some(CrawlState {
            visited: self.load_visited()?,
            pending: self.load_frontier()?,
            fetches: self.load_fetches()?,
            visits: self.load_visits()?,
            links: self.load_links()?,
            config_hash: self.read_meta(META_CONFIG_HASH)?,
            saved_at,
        }))
    }

    fn clear(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        for table in CHECKPOINT_TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }
        tx.commit()?;
        Ok(())
    }
}
