use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::use_cases::{
    CandidateDiscovery, GraphExpansion, Ranker, SnippetExtractor, DEFAULT_MAX_DEPTH,
};
use crate::application::{RepoRepository, SymbolRepository};
use crate::domain::{
    node_key, BundleLimits, BundleRepo, ContextBundle, DomainError, Edge, FocusItem, FocusType,
    NodeKind, RankedFile, RetrievalHints, Subgraph, SubgraphEdge, SubgraphNode,
};

const MIN_BUDGET: u32 = 100;
const MAX_BUDGET: u32 = 50_000;
const DEFAULT_BUDGET: u32 = 8_000;
const SEED_COUNT: usize = 5;
const FOCUS_FILES: usize = 10;
const FOCUS_SYMBOLS_PER_FILE: usize = 3;
const MAX_INTENT_CHARS: usize = 100;

/// The retriever: discovery → expansion → ranking → snippets → bundle.
pub struct ContextBundleUseCase {
    repos: Arc<dyn RepoRepository>,
    symbols: Arc<dyn SymbolRepository>,
    discovery: CandidateDiscovery,
    expansion: GraphExpansion,
    ranker: Ranker,
    extractor: SnippetExtractor,
}

impl ContextBundleUseCase {
    pub fn new(
        repos: Arc<dyn RepoRepository>,
        symbols: Arc<dyn SymbolRepository>,
        discovery: CandidateDiscovery,
        expansion: GraphExpansion,
        ranker: Ranker,
        extractor: SnippetExtractor,
    ) -> Self {
        Self {
            repos,
            symbols,
            discovery,
            expansion,
            ranker,
            extractor,
        }
    }

    pub async fn execute(
        &self,
        root: &Path,
        task: &str,
        budget: Option<u32>,
        hints: &RetrievalHints,
    ) -> Result<ContextBundle, DomainError> {
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

        let budget = budget.unwrap_or(DEFAULT_BUDGET).clamp(MIN_BUDGET, MAX_BUDGET);

        let candidates = self.discovery.execute(repo.id, task, hints).await?;

        let mut seeds: Vec<i64> = Vec::new();
        for candidate in &candidates {
            if !seeds.contains(&candidate.file_id) {
                seeds.push(candidate.file_id);
            }
            if seeds.len() == SEED_COUNT {
                break;
            }
        }

        let expansion = self
            .expansion
            .execute(repo.id, &seeds, DEFAULT_MAX_DEPTH)
            .await?;
        let ranked = self.ranker.merge(repo.id, &candidates, &expansion).await?;
        let (snippets, used_estimate) = self.extractor.execute(&root, &ranked, budget).await;

        let top = &ranked[..ranked.len().min(FOCUS_FILES)];
        let focus = build_focus(top);
        let subgraph = self.build_subgraph(top, &expansion.edges).await?;

        let mut notes = Vec::new();
        if candidates.is_empty() {
            notes.push("no candidates matched the task; bundle may be empty".to_string());
        }
        info!(
            "Context bundle: {} focus items, {} snippets, ~{} tokens",
            focus.len(),
            snippets.len(),
            used_estimate
        );

        Ok(ContextBundle {
            repo: BundleRepo {
                root: root_str,
                rev: None,
            },
            intent: intent_of(task),
            focus,
            snippets,
            subgraph,
            notes,
            limits: BundleLimits {
                budget,
                used_estimate,
            },
        })
    }

    /// Keeps traversed edges whose either endpoint lands in a selected
    /// file; symbol endpoints resolve to their owning file for that test.
    async fn build_subgraph(
        &self,
        top: &[RankedFile],
        edges: &[Edge],
    ) -> Result<Subgraph, DomainError> {
        let selected: HashSet<i64> = top.iter().map(|f| f.file_id).collect();
        let paths: HashMap<i64, &str> =
            top.iter().map(|f| (f.file_id, f.path.as_str())).collect();

        let mut subgraph = Subgraph::default();
        let mut seen_nodes: HashSet<String> = HashSet::new();

        for edge in edges {
            let src_file = self.owning_file(edge.src_type, edge.src_id).await?;
            let dst_file = self.owning_file(edge.dst_type, edge.dst_id).await?;
            let in_scope = src_file.map(|f| selected.contains(&f)).unwrap_or(false)
                || dst_file.map(|f| selected.contains(&f)).unwrap_or(false);
            if !in_scope {
                continue;
            }

            let src_key = node_key(edge.src_type.as_str(), edge.src_id);
            let dst_key = node_key(edge.dst_type.as_str(), edge.dst_id);

            for (key, kind, id, file) in [
                (&src_key, edge.src_type, edge.src_id, src_file),
                (&dst_key, edge.dst_type, edge.dst_id, dst_file),
            ] {
                if seen_nodes.insert(key.clone()) {
                    let path = file
                        .and_then(|f| paths.get(&f).map(|p| p.to_string()));
                    subgraph.nodes.push(SubgraphNode {
                        node_type: kind.as_str().to_string(),
                        id: node_key(kind.as_str(), id),
                        path,
                    });
                }
            }

            subgraph.edges.push(SubgraphEdge {
                src: src_key,
                rel: edge.rel.as_str().to_string(),
                dst: dst_key,
            });
        }

        debug!(
            "Subgraph: {} nodes, {} edges",
            subgraph.nodes.len(),
            subgraph.edges.len()
        );
        Ok(subgraph)
    }

    async fn owning_file(&self, kind: NodeKind, id: i64) -> Result<Option<i64>, DomainError> {
        match kind {
            NodeKind::File => Ok(Some(id)),
            NodeKind::Symbol => Ok(self.symbols.find_by_id(id).await?.map(|s| s.file_id)),
            NodeKind::Module => Ok(None),
        }
    }
}

fn build_focus(top: &[RankedFile]) -> Vec<FocusItem> {
    let mut focus = Vec::new();
    for file in top {
        focus.push(FocusItem {
            focus_type: FocusType::File,
            id: node_key("file", file.file_id),
            path: file.path.clone(),
            fq_name: None,
            reason: file.reasons.join(", "),
        });
        for symbol in file.symbols.iter().take(FOCUS_SYMBOLS_PER_FILE) {
            focus.push(FocusItem {
                focus_type: FocusType::Symbol,
                id: node_key("symbol", symbol.id),
                path: file.path.clone(),
                fq_name: Some(symbol.fq_name.clone()),
                reason: format!("defined in {}", file.path),
            });
        }
    }
    focus
}

/// Trim, collapse whitespace, truncate at 100 characters with an ellipsis.
fn intent_of(task: &str) -> String {
    let collapsed = task.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_INTENT_CHARS {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_INTENT_CHARS).collect();
    format!("{}...", truncated)
}
