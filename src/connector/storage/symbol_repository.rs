use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use crate::application::SymbolRepository;
use crate::domain::{DomainError, Symbol, SymbolKind};

const SYMBOL_COLUMNS: &str = "id, repo_id, file_id, kind, name, fq_name, signature, \
                              start_line, start_col, end_line, end_col";

pub struct SqliteSymbolRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSymbolRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn row_to_symbol(row: &rusqlite::Row<'_>) -> rusqlite::Result<Symbol> {
        Ok(Symbol {
            id: row.get(0)?,
            repo_id: row.get(1)?,
            file_id: row.get(2)?,
            kind: SymbolKind::parse(&row.get::<_, String>(3)?),
            name: row.get(4)?,
            fq_name: row.get(5)?,
            signature: row.get(6)?,
            start_line: row.get::<_, i64>(7)? as u32,
            start_col: row.get::<_, i64>(8)? as u32,
            end_line: row.get::<_, i64>(9)? as u32,
            end_col: row.get::<_, i64>(10)? as u32,
        })
    }

    fn query_symbols(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Symbol>, DomainError> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params, Self::row_to_symbol)
            .map_err(|e| DomainError::storage(format!("Failed to query symbols: {}", e)))?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols
                .push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(symbols)
    }
}

#[async_trait]
impl SymbolRepository for SqliteSymbolRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Symbol>, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {} FROM symbols WHERE id = ?1", SYMBOL_COLUMNS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![id], Self::row_to_symbol) {
            Ok(symbol) => Ok(Some(symbol)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to query symbol: {}",
                e
            ))),
        }
    }

    async fn find_by_name(&self, repo_id: i64, name: &str) -> Result<Vec<Symbol>, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM symbols WHERE repo_id = ?1 AND name = ?2",
            SYMBOL_COLUMNS
        );
        Self::query_symbols(&conn, &sql, params![repo_id, name])
    }

    async fn for_file(&self, repo_id: i64, file_id: i64) -> Result<Vec<Symbol>, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM symbols WHERE repo_id = ?1 AND file_id = ?2 ORDER BY start_line",
            SYMBOL_COLUMNS
        );
        Self::query_symbols(&conn, &sql, params![repo_id, file_id])
    }

    async fn count(&self, repo_id: i64) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM symbols WHERE repo_id = ?1",
                params![repo_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count symbols: {}", e)))?;
        Ok(count as u64)
    }
}
