use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{SearchIndex, SearchRow};
use crate::domain::{DomainError, NodeKind};

/// Characters with FTS5 query syntax meaning. Stripped before anything
/// user-supplied reaches the engine.
const FTS_SPECIAL_CHARS: &[char] = &[
    '*', '"', '(', ')', ':', '^', '{', '}', '~', '-', '+', '<', '>', '|', '@', '#', '\\',
];

/// Turns free-form text into a safe FTS5 query: special characters are
/// removed, tokens that survive the split are quoted and OR-ed, empty
/// tokens are dropped. Returns an empty string when nothing survives.
pub fn sanitize_fts_query(raw: &str) -> String {
    raw.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| !FTS_SPECIAL_CHARS.contains(c))
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{}\"", token))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub struct SqliteSearchIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSearchIndex {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SearchIndex for SqliteSearchIndex {
    async fn search(
        &self,
        repo_id: i64,
        raw_query: &str,
        limit: u32,
    ) -> Result<Vec<SearchRow>, DomainError> {
        let query = sanitize_fts_query(raw_query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().await;
        let mut stmt = match conn.prepare(
            "SELECT entity_type, entity_id, text, rank FROM search_index \
             WHERE repo_id = ?1 AND search_index MATCH ?2 \
             ORDER BY rank LIMIT ?3",
        ) {
            Ok(stmt) => stmt,
            Err(e) => {
                debug!("FTS prepare failed, returning empty results: {}", e);
                return Ok(Vec::new());
            }
        };

        let rows = match stmt.query_map(params![repo_id, query, limit], |row| {
            Ok(SearchRow {
                entity_type: NodeKind::parse(&row.get::<_, String>(0)?),
                entity_id: row.get(1)?,
                text: row.get(2)?,
                rank: row.get(3)?,
            })
        }) {
            Ok(rows) => rows,
            Err(e) => {
                debug!("FTS query failed, returning empty results: {}", e);
                return Ok(Vec::new());
            }
        };

        let mut hits = Vec::new();
        for row in rows {
            match row {
                Ok(hit) => hits.push(hit),
                Err(e) => {
                    debug!("FTS row failed, returning empty results: {}", e);
                    return Ok(Vec::new());
                }
            }
        }
        Ok(hits)
    }
}
