use async_trait::async_trait;

use crate::domain::{DomainError, Edge, NodeKind};

/// Traversal direction for neighbourhood queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// Result of a bounded BFS from a start node.
#[derive(Debug, Default)]
pub struct Neighbourhood {
    /// Visited nodes as `(kind, id)` pairs, including the start node.
    pub nodes: Vec<(NodeKind, i64)>,
    pub edges: Vec<Edge>,
}

#[async_trait]
pub trait EdgeRepository: Send + Sync {
    /// BFS over the edge relation from `start`, guarded by a visited set.
    async fn neighbours(
        &self,
        repo_id: i64,
        start: (NodeKind, i64),
        depth: u32,
        direction: Direction,
    ) -> Result<Neighbourhood, DomainError>;

    /// Edges usable for graph expansion out of one file: IMPORTS (and
    /// REFERENCES, when present) whose src is the file itself or any
    /// symbol the file owns.
    async fn expansion_edges(&self, repo_id: i64, file_id: i64) -> Result<Vec<Edge>, DomainError>;

    async fn count(&self, repo_id: i64) -> Result<u64, DomainError>;
}
