use std::path::Path;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use rmcp::{tool, tool_handler, tool_router};
use tracing::info;

use crate::container::Container;
use crate::domain::{DomainError, IndexMode, RetrievalHints};

use super::tools::{
    tool_result, ContextToolInput, IndexToolInput, SearchToolInput, SnippetToolInput,
    StatusToolInput,
};

/// MCP server exposing the five indexing and retrieval tools over stdio.
#[derive(Clone)]
pub struct CindexMcpServer {
    container: Arc<Container>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CindexMcpServer {
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            tool_router: Self::tool_router(),
        }
    }

    /// Report whether a repository is indexed, with file/symbol/edge counts.
    #[tool(name = "repo_status")]
    async fn repo_status(
        &self,
        params: Parameters<StatusToolInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let result = self
            .container
            .status_use_case()
            .execute(Path::new(&input.repo_path))
            .await;
        Ok(tool_result(result))
    }

    /// Index a repository. Mode auto-detects: incremental when the repo is
    /// already known, full otherwise.
    #[tool(name = "repo_index")]
    async fn repo_index(
        &self,
        params: Parameters<IndexToolInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let mode = match input.mode.as_deref() {
            None => Ok(None),
            Some(raw) => IndexMode::parse(raw).map(Some).ok_or_else(|| {
                DomainError::invalid_input(format!("Invalid mode: {}", raw))
            }),
        };
        let result = match mode {
            Err(e) => Err(e),
            Ok(mode) => {
                self.container
                    .index_use_case()
                    .execute(
                        Path::new(&input.repo_path),
                        mode,
                        input.level.unwrap_or(0).min(1),
                    )
                    .await
            }
        };
        Ok(tool_result(result))
    }

    /// Full-text search over indexed file paths and symbol names.
    #[tool(name = "repo_search")]
    async fn repo_search(
        &self,
        params: Parameters<SearchToolInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let result = self
            .container
            .search_use_case()
            .execute(Path::new(&input.repo_path), &input.query, input.limit)
            .await
            .map(|results| serde_json::json!({ "results": results }));
        Ok(tool_result(result))
    }

    /// Read a line range of a file directly from disk.
    #[tool(name = "repo_snippet")]
    async fn repo_snippet(
        &self,
        params: Parameters<SnippetToolInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let result = self
            .container
            .snippet_use_case()
            .execute(
                Path::new(&input.repo_path),
                &input.file_path,
                input.start_line,
                input.end_line,
            )
            .await;
        Ok(tool_result(result))
    }

    /// Build a budget-constrained context bundle for a task description.
    #[tool(name = "repo_context_get")]
    async fn repo_context_get(
        &self,
        params: Parameters<ContextToolInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let hints = input.hints.unwrap_or(RetrievalHints::default());
        let result = self
            .container
            .context_use_case()
            .execute(
                Path::new(&input.repo_path),
                &input.task,
                input.budget,
                &hints,
            )
            .await;
        Ok(tool_result(result))
    }
}

#[tool_handler]
impl ServerHandler for CindexMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Codebase indexing and retrieval server. Index a repository with \
                 repo_index, then use repo_context_get to fetch a ranked context \
                 bundle for a task, repo_search for full-text lookup, and \
                 repo_snippet to read file ranges."
                    .into(),
            ),
        }
    }
}

/// Serves the tool surface on stdio until the client disconnects.
pub async fn run_stdio(container: Arc<Container>) -> anyhow::Result<()> {
    use rmcp::transport::stdio;
    use rmcp::ServiceExt;

    info!("Starting MCP server on stdio");
    let service = CindexMcpServer::new(container).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
