use std::path::Path;
use std::sync::Arc;

use crate::application::{FileRepository, RepoRepository, SearchIndex, SymbolRepository};
use crate::domain::{DomainError, NodeKind, SearchHit};

/// Server-side bounds for `repo_search`.
const MIN_LIMIT: u32 = 1;
const MAX_LIMIT: u32 = 100;
const DEFAULT_LIMIT: u32 = 20;
const MAX_QUERY_CHARS: usize = 500;

pub struct SearchCodeUseCase {
    repos: Arc<dyn RepoRepository>,
    files: Arc<dyn FileRepository>,
    symbols: Arc<dyn SymbolRepository>,
    search: Arc<dyn SearchIndex>,
}

impl SearchCodeUseCase {
    pub fn new(
        repos: Arc<dyn RepoRepository>,
        files: Arc<dyn FileRepository>,
        symbols: Arc<dyn SymbolRepository>,
        search: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            repos,
            files,
            symbols,
            search,
        }
    }

    pub async fn execute(
        &self,
        root: &Path,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let root = root
            .canonicalize()
            .map_err(|e| DomainError::invalid_input(format!("Invalid path: {}", e)))?;
        if !root.is_dir() {
            return Err(DomainError::invalid_input(format!(
                "Not a directory: {}",
                root.display()
            )));
        }
        let root_str = root.to_string_lossy().to_string();

        let repo = self
            .repos
            .find_by_path(&root_str)
            .await?
            .ok_or_else(|| DomainError::not_indexed(root_str.clone()))?;

        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT);
        let query: String = query.chars().take(MAX_QUERY_CHARS).collect();

        let rows = self.search.search(repo.id, &query, limit).await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let path = match row.entity_type {
                NodeKind::File => row.text.clone(),
                NodeKind::Symbol => self.symbol_path(row.entity_id).await?,
                NodeKind::Module => continue,
            };
            hits.push(SearchHit {
                hit_type: row.entity_type.as_str().to_string(),
                path,
                excerpt: row.text,
                rank: row.rank,
            });
        }
        Ok(hits)
    }

    async fn symbol_path(&self, symbol_id: i64) -> Result<String, DomainError> {
        let Some(symbol) = self.symbols.find_by_id(symbol_id).await? else {
            return Ok(String::new());
        };
        let files = self.files.find_by_ids(&[symbol.file_id]).await?;
        Ok(files.into_iter().next().map(|f| f.path).unwrap_or_default())
    }
}
