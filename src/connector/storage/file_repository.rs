use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use crate::application::FileRepository;
use crate::domain::{DomainError, FileChanges, FileRecord, Language, SeenFile};

pub struct SqliteFileRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFileRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn row_to_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
        Ok(FileRecord {
            id: row.get(0)?,
            repo_id: row.get(1)?,
            path: row.get(2)?,
            lang: Language::parse(&row.get::<_, String>(3)?),
            sha256: row.get(4)?,
            mtime: row.get(5)?,
            size_bytes: row.get(6)?,
            last_indexed_at: row.get(7)?,
        })
    }

    fn load_all(conn: &Connection, repo_id: i64) -> Result<Vec<FileRecord>, DomainError> {
        let mut stmt = conn
            .prepare(
                "SELECT id, repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at \
                 FROM files WHERE repo_id = ?1",
            )
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params![repo_id], Self::row_to_file)
            .map_err(|e| DomainError::storage(format!("Failed to query files: {}", e)))?;

        let mut files = Vec::new();
        for row in rows {
            files.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(files)
    }
}

#[async_trait]
impl FileRepository for SqliteFileRepository {
    async fn find_changed(
        &self,
        repo_id: i64,
        seen: &[SeenFile],
    ) -> Result<FileChanges, DomainError> {
        let conn = self.conn.lock().await;
        let mut stored: HashMap<String, FileRecord> = Self::load_all(&conn, repo_id)?
            .into_iter()
            .map(|f| (f.path.clone(), f))
            .collect();

        let mut changes = FileChanges::default();
        for file in seen {
            match stored.remove(&file.path) {
                None => changes.new.push(file.path.clone()),
                Some(existing) => {
                    if existing.sha256 != file.sha256 || existing.mtime != file.mtime {
                        changes.changed.push(file.path.clone());
                    }
                }
            }
        }
        // Whatever is left in the store was not discovered this run.
        changes.deleted = stored.into_values().collect();
        changes.deleted.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(changes)
    }

    async fn find_by_path(
        &self,
        repo_id: i64,
        path: &str,
    ) -> Result<Option<FileRecord>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id, repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at \
                 FROM files WHERE repo_id = ?1 AND path = ?2",
            )
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![repo_id, path], Self::row_to_file) {
            Ok(file) => Ok(Some(file)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query file: {}", e))),
        }
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<FileRecord>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id, repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at \
                 FROM files WHERE id = ?1",
            )
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let mut files = Vec::new();
        for id in ids {
            match stmt.query_row(params![id], Self::row_to_file) {
                Ok(file) => files.push(file),
                Err(rusqlite::Error::QueryReturnedNoRows) => {}
                Err(e) => {
                    return Err(DomainError::storage(format!("Failed to query file: {}", e)))
                }
            }
        }
        Ok(files)
    }

    async fn list_paths(&self, repo_id: i64) -> Result<Vec<String>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT path FROM files WHERE repo_id = ?1")
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params![repo_id], |row| row.get::<_, String>(0))
            .map_err(|e| DomainError::storage(format!("Failed to query paths: {}", e)))?;

        let mut paths = Vec::new();
        for row in rows {
            paths.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(paths)
    }

    async fn count(&self, repo_id: i64) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM files WHERE repo_id = ?1",
                params![repo_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count files: {}", e)))?;
        Ok(count as u64)
    }

    async fn count_by_lang(&self, repo_id: i64) -> Result<HashMap<String, u64>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT lang, COUNT(*) FROM files WHERE repo_id = ?1 GROUP BY lang")
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params![repo_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })
            .map_err(|e| DomainError::storage(format!("Failed to count by language: {}", e)))?;

        let mut counts = HashMap::new();
        for row in rows {
            let (lang, n) =
                row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;
            counts.insert(lang, n);
        }
        Ok(counts)
    }
}
