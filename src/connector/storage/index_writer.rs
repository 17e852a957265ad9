//! Transactional write path for the indexer.
//!
//! Each public operation runs inside one rusqlite transaction so a reader
//! never observes a half-updated file: the transaction rolls back on drop
//! when any statement fails.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{BatchStats, FileToWrite, ImportLink, IndexWriter};
use crate::domain::{unix_timestamp, DomainError, EdgeRel, FileRecord, NodeKind, ParsedSymbol};

pub struct SqliteIndexWriter {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteIndexWriter {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

fn storage_err(e: rusqlite::Error) -> DomainError {
    DomainError::storage(e.to_string())
}

/// Deletes every edge sourced by the file or its symbols, the file's and
/// symbols' search rows, and the symbols themselves. The file row and
/// edges pointing *at* the file survive; a re-parse keeps them valid
/// because the file keeps its id.
fn delete_sourced_state(conn: &Connection, repo_id: i64, file_id: i64) -> Result<(), DomainError> {
    conn.execute(
        "DELETE FROM edges WHERE repo_id = ?1 \
           AND ((src_type = 'file' AND src_id = ?2) \
             OR (src_type = 'symbol' AND src_id IN \
                 (SELECT id FROM symbols WHERE file_id = ?2)))",
        params![repo_id, file_id],
    )
    .map_err(storage_err)?;

    delete_search_rows(conn, repo_id, file_id)?;

    conn.execute(
        "DELETE FROM symbols WHERE repo_id = ?1 AND file_id = ?2",
        params![repo_id, file_id],
    )
    .map_err(storage_err)?;

    Ok(())
}

/// Full cascade for a deleted file: every edge touching the file or its
/// symbols from either endpoint, all search rows, symbols, and finally
/// the file row itself.
fn delete_file_cascade(conn: &Connection, repo_id: i64, file_id: i64) -> Result<(), DomainError> {
    conn.execute(
        "DELETE FROM edges WHERE repo_id = ?1 \
           AND ((src_type = 'file' AND src_id = ?2) \
             OR (dst_type = 'file' AND dst_id = ?2) \
             OR (src_type = 'symbol' AND src_id IN \
                 (SELECT id FROM symbols WHERE file_id = ?2)) \
             OR (dst_type = 'symbol' AND dst_id IN \
                 (SELECT id FROM symbols WHERE file_id = ?2)))",
        params![repo_id, file_id],
    )
    .map_err(storage_err)?;

    delete_search_rows(conn, repo_id, file_id)?;

    conn.execute(
        "DELETE FROM symbols WHERE repo_id = ?1 AND file_id = ?2",
        params![repo_id, file_id],
    )
    .map_err(storage_err)?;

    conn.execute("DELETE FROM files WHERE id = ?1", params![file_id])
        .map_err(storage_err)?;

    Ok(())
}

fn delete_search_rows(conn: &Connection, repo_id: i64, file_id: i64) -> Result<(), DomainError> {
    // FTS5 has no upsert; rows are deleted here and re-inserted fresh.
    conn.execute(
        "DELETE FROM search_index WHERE repo_id = ?1 \
           AND ((entity_type = 'file' AND entity_id = ?2) \
             OR (entity_type = 'symbol' AND entity_id IN \
                 (SELECT id FROM symbols WHERE file_id = ?2)))",
        params![repo_id, file_id],
    )
    .map_err(storage_err)?;
    Ok(())
}

fn insert_edge(
    conn: &Connection,
    repo_id: i64,
    src: (NodeKind, i64),
    rel: EdgeRel,
    dst: (NodeKind, i64),
    meta_json: Option<&str>,
    now: i64,
) -> Result<(), DomainError> {
    conn.execute(
        "INSERT INTO edges (repo_id, src_type, src_id, rel, dst_type, dst_id, meta_json, weight, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            repo_id,
            src.0.as_str(),
            src.1,
            rel.as_str(),
            dst.0.as_str(),
            dst.1,
            meta_json,
            rel.weight(),
            now,
        ],
    )
    .map_err(storage_err)?;
    Ok(())
}

fn insert_search_row(
    conn: &Connection,
    repo_id: i64,
    entity_type: NodeKind,
    entity_id: i64,
    text: &str,
) -> Result<(), DomainError> {
    conn.execute(
        "INSERT INTO search_index (repo_id, entity_type, entity_id, text) VALUES (?1, ?2, ?3, ?4)",
        params![repo_id, entity_type.as_str(), entity_id, text],
    )
    .map_err(storage_err)?;
    Ok(())
}

fn upsert_file_row(
    conn: &Connection,
    repo_id: i64,
    file: &FileToWrite,
    now: i64,
) -> Result<i64, DomainError> {
    let existing: Option<i64> = match conn.query_row(
        "SELECT id FROM files WHERE repo_id = ?1 AND path = ?2",
        params![repo_id, file.path],
        |row| row.get(0),
    ) {
        Ok(id) => Some(id),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(storage_err(e)),
    };

    match existing {
        Some(id) => {
            delete_sourced_state(conn, repo_id, id)?;
            conn.execute(
                "UPDATE files SET lang = ?1, sha256 = ?2, mtime = ?3, size_bytes = ?4, \
                 last_indexed_at = ?5 WHERE id = ?6",
                params![
                    file.lang.as_str(),
                    file.sha256,
                    file.mtime,
                    file.size_bytes,
                    now,
                    id
                ],
            )
            .map_err(storage_err)?;
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO files (repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    repo_id,
                    file.path,
                    file.lang.as_str(),
                    file.sha256,
                    file.mtime,
                    file.size_bytes,
                    now
                ],
            )
            .map_err(storage_err)?;
            Ok(conn.last_insert_rowid())
        }
    }
}

fn insert_symbol(
    conn: &Connection,
    repo_id: i64,
    file_id: i64,
    path: &str,
    sym: &ParsedSymbol,
) -> Result<i64, DomainError> {
    let fq_name = format!("{}:{}", path, sym.name);
    conn.execute(
        "INSERT INTO symbols (repo_id, file_id, kind, name, fq_name, signature, \
                              start_line, start_col, end_line, end_col) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            repo_id,
            file_id,
            sym.kind.as_str(),
            sym.name,
            fq_name,
            sym.signature,
            sym.start_line as i64,
            sym.start_col as i64,
            sym.end_line as i64,
            sym.end_col as i64,
        ],
    )
    .map_err(storage_err)?;
    Ok(conn.last_insert_rowid())
}

fn write_one_file(
    conn: &Connection,
    repo_id: i64,
    file: &FileToWrite,
    stats: &mut BatchStats,
) -> Result<(), DomainError> {
    let now = unix_timestamp();
    let file_id = upsert_file_row(conn, repo_id, file, now)?;
    let file_node = (NodeKind::File, file_id);

    // Insert symbols, remembering name → id for intra-file edge lookups.
    let mut by_name: HashMap<&str, i64> = HashMap::new();
    let mut symbol_ids = Vec::with_capacity(file.parsed.symbols.len());
    for sym in &file.parsed.symbols {
        let id = insert_symbol(conn, repo_id, file_id, &file.path, sym)?;
        by_name.entry(sym.name.as_str()).or_insert(id);
        symbol_ids.push(id);
        stats.symbols += 1;

        let fq_name = format!("{}:{}", file.path, sym.name);
        insert_search_row(
            conn,
            repo_id,
            NodeKind::Symbol,
            id,
            &format!("{} {}", sym.name, fq_name),
        )?;

        insert_edge(
            conn,
            repo_id,
            file_node,
            EdgeRel::Defines,
            (NodeKind::Symbol, id),
            None,
            now,
        )?;
        stats.edges += 1;
    }

    // EXPORTS only for exported names that resolve to a symbol in this file.
    for export in &file.parsed.exports {
        if let Some(&sym_id) = by_name.get(export.name.as_str()) {
            insert_edge(
                conn,
                repo_id,
                file_node,
                EdgeRel::Exports,
                (NodeKind::Symbol, sym_id),
                None,
                now,
            )?;
            stats.edges += 1;
        }
    }

    // Intra-file inheritance, matched by bare name.
    for (sym, &sym_id) in file.parsed.symbols.iter().zip(symbol_ids.iter()) {
        if let Some(parent) = &sym.extends {
            if let Some(&target) = by_name.get(parent.as_str()) {
                if target != sym_id {
                    insert_edge(
                        conn,
                        repo_id,
                        (NodeKind::Symbol, sym_id),
                        EdgeRel::Extends,
                        (NodeKind::Symbol, target),
                        None,
                        now,
                    )?;
                    stats.edges += 1;
                }
            }
        }
        for iface in &sym.implements {
            if let Some(&target) = by_name.get(iface.as_str()) {
                if target != sym_id {
                    insert_edge(
                        conn,
                        repo_id,
                        (NodeKind::Symbol, sym_id),
                        EdgeRel::Implements,
                        (NodeKind::Symbol, target),
                        None,
                        now,
                    )?;
                    stats.edges += 1;
                }
            }
        }
    }

    insert_search_row(conn, repo_id, NodeKind::File, file_id, &file.path)?;
    stats.files += 1;
    Ok(())
}

#[async_trait]
impl IndexWriter for SqliteIndexWriter {
    async fn write_batch(
        &self,
        repo_id: i64,
        batch: &[FileToWrite],
    ) -> Result<BatchStats, DomainError> {
        let conn = self.conn.lock().await;
        let tx = conn.unchecked_transaction().map_err(storage_err)?;

        let mut stats = BatchStats::default();
        for file in batch {
            write_one_file(&tx, repo_id, file, &mut stats)?;
        }

        tx.commit().map_err(storage_err)?;
        debug!(
            "Wrote batch: {} files, {} symbols, {} edges",
            stats.files, stats.symbols, stats.edges
        );
        Ok(stats)
    }

    async fn write_import_edges(
        &self,
        repo_id: i64,
        links: &[ImportLink],
    ) -> Result<u64, DomainError> {
        if links.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.lock().await;
        let tx = conn.unchecked_transaction().map_err(storage_err)?;
        let now = unix_timestamp();

        let mut lookup = tx
            .prepare("SELECT id FROM files WHERE repo_id = ?1 AND path = ?2")
            .map_err(storage_err)?;

        let mut written = 0u64;
        for link in links {
            let src: Option<i64> = match lookup
                .query_row(params![repo_id, link.src_path], |row| row.get(0))
            {
                Ok(id) => Some(id),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(storage_err(e)),
            };
            let dst: Option<i64> = match lookup
                .query_row(params![repo_id, link.dst_path], |row| row.get(0))
            {
                Ok(id) => Some(id),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(storage_err(e)),
            };

            let (src, dst) = match (src, dst) {
                (Some(s), Some(d)) if s != d => (s, d),
                _ => continue,
            };

            let meta_json = serde_json::to_string(&link.meta)
                .map_err(|e| DomainError::internal(format!("Failed to encode edge meta: {}", e)))?;
            insert_edge(
                &tx,
                repo_id,
                (NodeKind::File, src),
                EdgeRel::Imports,
                (NodeKind::File, dst),
                Some(&meta_json),
                now,
            )?;
            written += 1;
        }

        drop(lookup);
        tx.commit().map_err(storage_err)?;
        debug!("Wrote {} import edges", written);
        Ok(written)
    }

    async fn delete_files(
        &self,
        repo_id: i64,
        files: &[FileRecord],
    ) -> Result<u64, DomainError> {
        if files.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.lock().await;
        let tx = conn.unchecked_transaction().map_err(storage_err)?;

        for file in files {
            delete_file_cascade(&tx, repo_id, file.id)?;
        }

        tx.commit().map_err(storage_err)?;
        debug!("Deleted {} files", files.len());
        Ok(files.len() as u64)
    }
}
