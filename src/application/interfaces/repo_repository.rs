use async_trait::async_trait;

use crate::domain::{DomainError, RepoRecord};

#[async_trait]
pub trait RepoRepository: Send + Sync {
    /// Creates the repo row on first sight of a root, or bumps
    /// `updated_at` when it already exists.
    async fn upsert(&self, root_path: &str) -> Result<RepoRecord, DomainError>;

    async fn find_by_path(&self, root_path: &str) -> Result<Option<RepoRecord>, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<RepoRecord>, DomainError>;
}
