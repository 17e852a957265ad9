//! Wires the store, adapters, and use cases together. Constructed once at
//! process start; the store connection is the only process-wide mutable
//! resource and every module receives it as an explicit collaborator.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{
    CandidateDiscovery, ContextBundleUseCase, EdgeRepository, FileRepository, FileSnippetUseCase,
    GraphExpansion, IndexRepositoryUseCase, IndexWriter, ParserService, Ranker, RepoRepository,
    RepoStatusUseCase, SearchCodeUseCase, SearchIndex, SnippetExtractor, SymbolRepository,
};
use crate::connector::parser::TreeSitterParserService;
use crate::connector::storage::{
    SqliteEdgeRepository, SqliteFileRepository, SqliteIndexWriter, SqliteRepoRepository,
    SqliteSearchIndex, SqliteStore, SqliteSymbolRepository,
};
use crate::domain::DomainError;

/// Store location: `CINDEX_DB_PATH` when set, else `~/.cindex/cindex.db`.
pub fn default_db_path() -> PathBuf {
    if let Some(path) = std::env::var_os("CINDEX_DB_PATH") {
        return PathBuf::from(path);
    }
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".cindex").join("cindex.db")
}

pub struct Container {
    repos: Arc<dyn RepoRepository>,
    files: Arc<dyn FileRepository>,
    symbols: Arc<dyn SymbolRepository>,
    edges: Arc<dyn EdgeRepository>,
    search: Arc<dyn SearchIndex>,
    writer: Arc<dyn IndexWriter>,
    parser: Arc<dyn ParserService>,
}

impl Container {
    pub fn new(db_path: &std::path::Path) -> Result<Self, DomainError> {
        let store = SqliteStore::new(db_path)?;
        Ok(Self::from_store(store))
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        Ok(Self::from_store(SqliteStore::in_memory()?))
    }

    fn from_store(store: SqliteStore) -> Self {
        Self {
            repos: Arc::new(SqliteRepoRepository::new(store.connection())),
            files: Arc::new(SqliteFileRepository::new(store.connection())),
            symbols: Arc::new(SqliteSymbolRepository::new(store.connection())),
            edges: Arc::new(SqliteEdgeRepository::new(store.connection())),
            search: Arc::new(SqliteSearchIndex::new(store.connection())),
            writer: Arc::new(SqliteIndexWriter::new(store.connection())),
            parser: Arc::new(TreeSitterParserService::new()),
        }
    }

    pub fn index_use_case(&self) -> IndexRepositoryUseCase {
        IndexRepositoryUseCase::new(
            Arc::clone(&self.repos),
            Arc::clone(&self.files),
            Arc::clone(&self.symbols),
            Arc::clone(&self.edges),
            Arc::clone(&self.writer),
            Arc::clone(&self.parser),
        )
    }

    pub fn status_use_case(&self) -> RepoStatusUseCase {
        RepoStatusUseCase::new(
            Arc::clone(&self.repos),
            Arc::clone(&self.files),
            Arc::clone(&self.symbols),
            Arc::clone(&self.edges),
        )
    }

    pub fn search_use_case(&self) -> SearchCodeUseCase {
        SearchCodeUseCase::new(
            Arc::clone(&self.repos),
            Arc::clone(&self.files),
            Arc::clone(&self.symbols),
            Arc::clone(&self.search),
        )
    }

    pub fn snippet_use_case(&self) -> FileSnippetUseCase {
        FileSnippetUseCase::new()
    }

    pub fn context_use_case(&self) -> ContextBundleUseCase {
        ContextBundleUseCase::new(
            Arc::clone(&self.repos),
            Arc::clone(&self.symbols),
            CandidateDiscovery::new(
                Arc::clone(&self.files),
                Arc::clone(&self.symbols),
                Arc::clone(&self.search),
            ),
            GraphExpansion::new(Arc::clone(&self.edges), Arc::clone(&self.symbols)),
            Ranker::new(Arc::clone(&self.files), Arc::clone(&self.symbols)),
            SnippetExtractor::new(),
        )
    }
}
