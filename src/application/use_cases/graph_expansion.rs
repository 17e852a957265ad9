use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::application::{EdgeRepository, SymbolRepository};
use crate::domain::{DomainError, Expansion, ExpandedFile, NodeKind};

pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Score by BFS depth; deeper than the table scores 0 and stops the walk.
fn depth_score(depth: u32) -> f64 {
    match depth {
        0 => 5.0,
        1 => 3.0,
        2 => 1.0,
        _ => 0.0,
    }
}

pub struct GraphExpansion {
    edges: Arc<dyn EdgeRepository>,
    symbols: Arc<dyn SymbolRepository>,
}

impl GraphExpansion {
    pub fn new(edges: Arc<dyn EdgeRepository>, symbols: Arc<dyn SymbolRepository>) -> Self {
        Self { edges, symbols }
    }

    /// BFS over file nodes from the seeds, following IMPORTS (and
    /// REFERENCES) out of each file or its symbols. Symbol destinations
    /// resolve to their owning file; module destinations are not crossed.
    pub async fn execute(
        &self,
        repo_id: i64,
        seed_file_ids: &[i64],
        max_depth: u32,
    ) -> Result<Expansion, DomainError> {
        let mut expansion = Expansion::default();
        let mut visited: HashSet<i64> = HashSet::new();
        let mut seen_edges: HashSet<i64> = HashSet::new();

        let mut frontier: Vec<i64> = Vec::new();
        for &seed in seed_file_ids {
            if visited.insert(seed) {
                expansion.files.push(ExpandedFile {
                    file_id: seed,
                    depth: 0,
                    score: depth_score(0),
                });
                frontier.push(seed);
            }
        }

        for depth in 0..max_depth {
            let next_depth = depth + 1;
            let next_score = depth_score(next_depth);
            let mut next = Vec::new();

            for file_id in frontier {
                for edge in self.edges.expansion_edges(repo_id, file_id).await? {
                    let Some(dst_file) = self.destination_file(&edge.dst_type, edge.dst_id).await?
                    else {
                        continue;
                    };
                    if seen_edges.insert(edge.id) {
                        expansion.edges.push(edge);
                    }
                    if visited.insert(dst_file) {
                        expansion.files.push(ExpandedFile {
                            file_id: dst_file,
                            depth: next_depth,
                            score: next_score,
                        });
                        if next_score > 0.0 {
                            next.push(dst_file);
                        }
                    }
                }
            }

            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        debug!(
            "Expansion visited {} files over {} edges",
            expansion.files.len(),
            expansion.edges.len()
        );
        Ok(expansion)
    }

    async fn destination_file(
        &self,
        dst_type: &NodeKind,
        dst_id: i64,
    ) -> Result<Option<i64>, DomainError> {
        match dst_type {
            NodeKind::File => Ok(Some(dst_id)),
            NodeKind::Symbol => Ok(self
                .symbols
                .find_by_id(dst_id)
                .await?
                .map(|s| s.file_id)),
            NodeKind::Module => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_scores() {
        assert_eq!(depth_score(0), 5.0);
        assert_eq!(depth_score(1), 3.0);
        assert_eq!(depth_score(2), 1.0);
        assert_eq!(depth_score(3), 0.0);
    }
}
