//! Database schema definitions for the checkpoint file

/// SQL schema for the checkpoint database
///
/// Every row table carries a `seq` column holding the row's position in the
/// in-memory table, so saves can append and loads restore the exact order.
pub const SCHEMA_SQL: &str = r#"
-- Checkpoint metadata (state_version, saved_at, config_hash)
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Claimed URLs in claim order
CREATE TABLE IF NOT EXISTS visited (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL
);

-- Pending frontier entries, replaced on every save
CREATE TABLE IF NOT EXISTS frontier (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    depth INTEGER NOT NULL
);

-- Fetch table: one row per attempted URL
CREATE TABLE IF NOT EXISTS fetches (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Visit table: one row per successfully visited page
CREATE TABLE IF NOT EXISTS visits (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    byte_size INTEGER NOT NULL,
    outlink_count INTEGER NOT NULL,
    content_type TEXT NOT NULL
);

-- Links table: one row per distinct outbound link
CREATE TABLE IF NOT EXISTS links (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    indicator TEXT NOT NULL
);
"#;

/// Tables holding checkpoint rows, in the order they are cleared
pub const CHECKPOINT_TABLES: &[&str] = &["meta", "visited", "frontier", "fetches", "visits", "links"];

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
