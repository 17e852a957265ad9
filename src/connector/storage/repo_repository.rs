use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use crate::application::RepoRepository;
use crate::domain::{unix_timestamp, DomainError, RepoRecord};

pub struct SqliteRepoRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepoRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn row_to_repo(row: &rusqlite::Row<'_>) -> rusqlite::Result<RepoRecord> {
        Ok(RepoRecord {
            id: row.get(0)?,
            root_path: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}

#[async_trait]
impl RepoRepository for SqliteRepoRepository {
    async fn upsert(&self, root_path: &str) -> Result<RepoRecord, DomainError> {
        let conn = self.conn.lock().await;
        let now = unix_timestamp();

        conn.execute(
            r#"INSERT INTO repos (root_path, created_at, updated_at)
               VALUES (?1, ?2, ?2)
               ON CONFLICT (root_path) DO UPDATE SET updated_at = excluded.updated_at"#,
            params![root_path, now],
        )
        .map_err(|e| DomainError::storage(format!("Failed to upsert repo: {}", e)))?;

        let mut stmt = conn
            .prepare("SELECT id, root_path, created_at, updated_at FROM repos WHERE root_path = ?1")
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        stmt.query_row(params![root_path], Self::row_to_repo)
            .map_err(|e| DomainError::storage(format!("Failed to read repo after upsert: {}", e)))
    }

    async fn find_by_path(&self, root_path: &str) -> Result<Option<RepoRecord>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id, root_path, created_at, updated_at FROM repos WHERE root_path = ?1")
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![root_path], Self::row_to_repo) {
            Ok(repo) => Ok(Some(repo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query repo: {}", e))),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<RepoRecord>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id, root_path, created_at, updated_at FROM repos WHERE id = ?1")
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![id], Self::row_to_repo) {
            Ok(repo) => Ok(Some(repo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query repo: {}", e))),
        }
    }
}
