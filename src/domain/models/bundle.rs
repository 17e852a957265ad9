use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Edge, Symbol};

/// Optional steering for candidate discovery.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct RetrievalHints {
    /// Repo-relative paths known to matter for the task
    pub paths: Option<Vec<String>>,
    /// Symbol names known to matter for the task
    pub symbols: Option<Vec<String>>,
    /// Restrict discovery to one language
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateType {
    File,
    Symbol,
}

/// A scored seed produced by candidate discovery. Always resolves to a
/// file via `file_id`, even when the match was a symbol.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub candidate_type: CandidateType,
    pub id: i64,
    pub file_id: i64,
    pub path: String,
    pub score: f64,
    pub reason: String,
}

/// A file reached by graph expansion, with its depth-decayed score.
#[derive(Debug, Clone)]
pub struct ExpandedFile {
    pub file_id: i64,
    pub depth: u32,
    pub score: f64,
}

/// Expansion output: visited file nodes plus every traversed edge.
#[derive(Debug, Default)]
pub struct Expansion {
    pub files: Vec<ExpandedFile>,
    pub edges: Vec<Edge>,
}

/// A file after rank merging, carrying its attached symbols.
#[derive(Debug, Clone)]
pub struct RankedFile {
    pub file_id: i64,
    pub path: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub symbols: Vec<Symbol>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub path: String,
    pub start: u32,
    pub end: u32,
    pub sha256: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusType {
    File,
    Symbol,
}

#[derive(Debug, Clone, Serialize)]
pub struct FocusItem {
    #[serde(rename = "type")]
    pub focus_type: FocusType,
    pub id: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fq_name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubgraphNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubgraphEdge {
    pub src: String,
    pub rel: String,
    pub dst: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Subgraph {
    pub nodes: Vec<SubgraphNode>,
    pub edges: Vec<SubgraphEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleRepo {
    pub root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleLimits {
    pub budget: u32,
    pub used_estimate: u32,
}

/// The structured retrieval output returned by `repo_context_get`.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    pub repo: BundleRepo,
    pub intent: String,
    pub focus: Vec<FocusItem>,
    pub snippets: Vec<Snippet>,
    pub subgraph: Subgraph,
    pub notes: Vec<String>,
    pub limits: BundleLimits,
}

/// String key used for subgraph endpoints: `"<type>:<id>"`.
pub fn node_key(node_type: &str, id: i64) -> String {
    format!("{}:{}", node_type, id)
}
