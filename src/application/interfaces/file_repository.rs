use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{DomainError, FileChanges, FileRecord, SeenFile};

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Buckets the currently-discovered files against the stored rows.
    /// This is the only place change detection is computed: `new` paths
    /// have no row, `changed` rows differ in sha256 or mtime, `deleted`
    /// rows exist in the store but not in `seen`.
    async fn find_changed(
        &self,
        repo_id: i64,
        seen: &[SeenFile],
    ) -> Result<FileChanges, DomainError>;

    async fn find_by_path(
        &self,
        repo_id: i64,
        path: &str,
    ) -> Result<Option<FileRecord>, DomainError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<FileRecord>, DomainError>;

    async fn list_paths(&self, repo_id: i64) -> Result<Vec<String>, DomainError>;

    async fn count(&self, repo_id: i64) -> Result<u64, DomainError>;

    async fn count_by_lang(&self, repo_id: i64) -> Result<HashMap<String, u64>, DomainError>;
}
