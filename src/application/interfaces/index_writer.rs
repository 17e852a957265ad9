use async_trait::async_trait;

use crate::domain::{DomainError, FileRecord, ImportEdgeMeta, Language, ParsedFile};

/// Everything needed to (re-)materialise one file in the store.
#[derive(Debug)]
pub struct FileToWrite {
    pub path: String,
    pub lang: Language,
    pub sha256: String,
    pub mtime: i64,
    pub size_bytes: i64,
    pub parsed: ParsedFile,
}

/// A resolved cross-file import, ready to become an IMPORTS edge.
#[derive(Debug)]
pub struct ImportLink {
    pub src_path: String,
    pub dst_path: String,
    pub meta: ImportEdgeMeta,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BatchStats {
    pub files: u64,
    pub symbols: u64,
    pub edges: u64,
}

/// Transactional write port for the indexer. Every method runs its whole
/// batch inside a single store transaction: on error the transaction
/// rolls back and readers never observe a half-updated file.
#[async_trait]
pub trait IndexWriter: Send + Sync {
    /// Per file: delete all edges sourced by the file or its symbols, its
    /// symbols, and its search rows; then upsert the file row and insert
    /// fresh symbols, DEFINES/EXPORTS and intra-file EXTENDS/IMPLEMENTS
    /// edges, and search rows.
    async fn write_batch(
        &self,
        repo_id: i64,
        batch: &[FileToWrite],
    ) -> Result<BatchStats, DomainError>;

    /// Inserts file→file IMPORTS edges. Links whose endpoints cannot be
    /// found, or that would point a file at itself, are skipped.
    async fn write_import_edges(
        &self,
        repo_id: i64,
        links: &[ImportLink],
    ) -> Result<u64, DomainError>;

    /// Removes files and everything attached to them: symbols, search
    /// rows, and every edge touching the file or its symbols from either
    /// endpoint.
    async fn delete_files(&self, repo_id: i64, files: &[FileRecord])
        -> Result<u64, DomainError>;
}
