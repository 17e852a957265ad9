use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    Full,
    Incremental,
}

impl IndexMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMode::Full => "full",
            IndexMode::Incremental => "incremental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(IndexMode::Full),
            "incremental" => Some(IndexMode::Incremental),
            _ => None,
        }
    }
}

/// Outcome of one index run. Unchanged files count in neither
/// `files_indexed` nor `files_skipped`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub repo_id: i64,
    pub mode: IndexMode,
    pub level: u8,
    pub files_indexed: u64,
    pub files_skipped: u64,
    pub files_deleted: u64,
    pub symbol_count: u64,
    pub edge_count: u64,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

/// Per-language file counts reported by `repo_status`.
#[derive(Debug, Clone, Serialize)]
pub struct FileCounts {
    pub total: u64,
    #[serde(rename = "byLang")]
    pub by_lang: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepoStatus {
    NotIndexed,
    Indexed {
        #[serde(rename = "repoId")]
        repo_id: i64,
        #[serde(rename = "rootPath")]
        root_path: String,
        #[serde(rename = "lastIndexedAt")]
        last_indexed_at: i64,
        #[serde(rename = "fileCounts")]
        file_counts: FileCounts,
        #[serde(rename = "symbolCount")]
        symbol_count: u64,
        #[serde(rename = "edgeCount")]
        edge_count: u64,
    },
}

/// One `repo_search` result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub hit_type: String,
    pub path: String,
    pub excerpt: String,
    pub rank: f64,
}

/// `repo_snippet` output; reads disk directly, not the store.
#[derive(Debug, Clone, Serialize)]
pub struct FileSnippet {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub total_lines: u32,
    pub text: String,
}
