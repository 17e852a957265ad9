use std::path::Path;
use std::sync::Arc;

use crate::application::{EdgeRepository, FileRepository, RepoRepository, SymbolRepository};
use crate::domain::{DomainError, FileCounts, RepoStatus};

pub struct RepoStatusUseCase {
    repos: Arc<dyn RepoRepository>,
    files: Arc<dyn FileRepository>,
    symbols: Arc<dyn SymbolRepository>,
    edges: Arc<dyn EdgeRepository>,
}

impl RepoStatusUseCase {
    pub fn new(
        repos: Arc<dyn RepoRepository>,
        files: Arc<dyn FileRepository>,
        symbols: Arc<dyn SymbolRepository>,
        edges: Arc<dyn EdgeRepository>,
    ) -> Self {
        Self {
            repos,
            files,
            symbols,
            edges,
        }
    }

    pub async fn execute(&self, root: &Path) -> Result<RepoStatus, DomainError> {
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

        let Some(repo) = self.repos.find_by_path(&root_str).await? else {
            return Ok(RepoStatus::NotIndexed);
        };

        let by_lang = self.files.count_by_lang(repo.id).await?;
        let total = by_lang.values().sum();

        Ok(RepoStatus::Indexed {
            repo_id: repo.id,
            root_path: repo.root_path,
            last_indexed_at: repo.updated_at,
            file_counts: FileCounts { total, by_lang },
            symbol_count: self.symbols.count(repo.id).await?,
            edge_count: self.edges.count(repo.id).await?,
        })
    }
}
