//! Single-file SQLite store shared by every adapter in this module.
//!
//! The connection is opened once per process and handed around as
//! `Arc<Mutex<Connection>>`; WAL journalling lets retrieval read while an
//! index batch writes, as long as both go through this one handle.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::DomainError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS repos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    root_path TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER NOT NULL REFERENCES repos(id) ON DELETE CASCADE,
    path TEXT NOT NULL,
    lang TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    mtime INTEGER NOT NULL,
    size_bytes INTEGER NOT NULL,
    last_indexed_at INTEGER NOT NULL,
    UNIQUE (repo_id, path)
);

CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER NOT NULL,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    fq_name TEXT NOT NULL,
    signature TEXT,
    start_line INTEGER NOT NULL,
    start_col INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    end_col INTEGER NOT NULL
);

-- Endpoint kinds are heterogeneous (file/symbol/module), so edges carry
-- string-tagged endpoints instead of foreign keys and are deleted
-- explicitly by the writer.
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER NOT NULL,
    src_type TEXT NOT NULL,
    src_id INTEGER NOT NULL,
    rel TEXT NOT NULL,
    dst_type TEXT NOT NULL,
    dst_id INTEGER NOT NULL,
    meta_json TEXT,
    weight REAL NOT NULL,
    created_at INTEGER NOT NULL
);

-- External package records. Reserved: nothing writes these yet.
CREATE TABLE IF NOT EXISTS modules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    version TEXT,
    manifest_path TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_repo_path ON files(repo_id, path);
CREATE INDEX IF NOT EXISTS idx_symbols_repo_file ON symbols(repo_id, file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_repo_name ON symbols(repo_id, name);
CREATE INDEX IF NOT EXISTS idx_symbols_repo_fq ON symbols(repo_id, fq_name);
CREATE INDEX IF NOT EXISTS idx_edges_repo_src ON edges(repo_id, src_type, src_id);
CREATE INDEX IF NOT EXISTS idx_edges_repo_dst ON edges(repo_id, dst_type, dst_id);
CREATE INDEX IF NOT EXISTS idx_edges_repo_rel ON edges(repo_id, rel);

CREATE VIRTUAL TABLE IF NOT EXISTS search_index USING fts5(
    repo_id UNINDEXED,
    entity_type UNINDEXED,
    entity_id UNINDEXED,
    text
);
"#;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::storage(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("Failed to open database: {}", e)))?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to create in-memory database: {}", e))
        })?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn initialize(conn: &Connection) -> Result<(), DomainError> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::storage(format!("Failed to set journal mode: {}", e)))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| DomainError::storage(format!("Failed to set synchronous mode: {}", e)))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| DomainError::storage(format!("Failed to enable foreign keys: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| DomainError::storage(format!("Failed to initialize schema: {}", e)))?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Returns a clone of the shared connection Arc for the adapters.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}
