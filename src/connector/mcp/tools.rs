use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{DomainError, RetrievalHints};

/// Input for the repo_status tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatusToolInput {
    /// Absolute path to the repository root
    pub repo_path: String,
}

/// Input for the repo_index tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IndexToolInput {
    /// Absolute path to the repository root
    pub repo_path: String,

    /// "full" or "incremental"; auto-detected when omitted
    pub mode: Option<String>,

    /// Index level, clamped to 0 or 1 (default 0)
    pub level: Option<u8>,
}

/// Input for the repo_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchToolInput {
    /// Absolute path to the repository root
    pub repo_path: String,

    /// Free-form search text (max 500 characters)
    pub query: String,

    /// Maximum number of results, clamped to [1, 100] (default 20)
    pub limit: Option<u32>,
}

/// Input for the repo_snippet tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SnippetToolInput {
    /// Absolute path to the repository root
    pub repo_path: String,

    /// Repo-relative file path
    pub file_path: String,

    /// First line, 1-based inclusive; defaults to the whole file
    pub start_line: Option<u32>,

    /// Last line, 1-based inclusive; defaults to the whole file
    pub end_line: Option<u32>,
}

/// Input for the repo_context_get tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContextToolInput {
    /// Absolute path to the repository root
    pub repo_path: String,

    /// Natural-language task description
    pub task: String,

    /// Snippet token budget, clamped to [100, 50000] (default 8000)
    pub budget: Option<u32>,

    /// Optional discovery hints
    pub hints: Option<RetrievalHints>,
}

/// Renders a tool outcome. Every error leaves this boundary as a
/// structured `{error: …}` payload, never as a protocol failure.
pub fn tool_result<T: Serialize>(result: Result<T, DomainError>) -> CallToolResult {
    let payload = match result {
        Ok(value) => match serde_json::to_value(&value) {
            Ok(value) => value,
            Err(e) => json!({ "error": format!("Failed to serialize result: {}", e) }),
        },
        Err(e) => match e.suggestion() {
            Some(suggestion) => json!({ "error": e.to_string(), "suggestion": suggestion }),
            None => json!({ "error": e.to_string() }),
        },
    };
    let text = serde_json::to_string_pretty(&payload)
        .unwrap_or_else(|_| r#"{"error":"unserializable result"}"#.to_string());
    CallToolResult::success(vec![Content::text(text)])
}
