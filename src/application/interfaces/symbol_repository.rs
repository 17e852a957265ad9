use async_trait::async_trait;

use crate::domain::{DomainError, Symbol};

#[async_trait]
pub trait SymbolRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Symbol>, DomainError>;

    /// Exact-name lookup.
    async fn find_by_name(&self, repo_id: i64, name: &str) -> Result<Vec<Symbol>, DomainError>;

    async fn for_file(&self, repo_id: i64, file_id: i64) -> Result<Vec<Symbol>, DomainError>;

    async fn count(&self, repo_id: i64) -> Result<u64, DomainError>;
}
