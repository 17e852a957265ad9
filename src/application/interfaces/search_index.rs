use async_trait::async_trait;

use crate::domain::{DomainError, NodeKind};

/// One full-text hit. `rank` is the engine's bm25 rank: negative, and
/// more negative for better matches.
#[derive(Debug, Clone)]
pub struct SearchRow {
    pub entity_type: NodeKind,
    pub entity_id: i64,
    pub text: String,
    pub rank: f64,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Runs a sanitised full-text query. Free-form input is safe here:
    /// sanitisation happens inside, and engine errors come back as empty
    /// results rather than failures.
    async fn search(
        &self,
        repo_id: i64,
        raw_query: &str,
        limit: u32,
    ) -> Result<Vec<SearchRow>, DomainError>;
}
