//! MCP adapter for the sandboxed filesystem operations
//!
//! Exposes the same handlers as the line dispatcher as MCP tools through
//! rmcp. Tool failures (denials, bad paths, I/O errors) come back as
//! `isError` tool results rather than protocol errors.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError,
};

use crate::handlers;
use crate::params::*;
use crate::sandbox::Sandbox;
use crate::types::FsResult;

/// The sandboxed filesystem MCP server
#[derive(Clone)]
pub struct SandboxFsMcpServer {
    sandbox: Sandbox,
    tool_router: ToolRouter<Self>,
}

/// Convert a handler outcome into a tool result
fn tool_result(outcome: FsResult<String>) -> Result<CallToolResult, McpError> {
    Ok(match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => {
            tracing::debug!("Tool failed: {}", e);
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    })
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl SandboxFsMcpServer {
    pub fn new(sandbox: Sandbox) -> Self {
        Self {
            sandbox,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Read the complete contents of a file from the filesystem")]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(handlers::read_file(&self.sandbox, params).await)
    }

    #[tool(description = "Write content to a file (overwrites existing content)")]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(handlers::write_file(&self.sandbox, params).await)
    }

    #[tool(description = "List the contents of a directory")]
    async fn list_directory(
        &self,
        Parameters(params): Parameters<ListDirectoryParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(handlers::list_directory(&self.sandbox, params).await)
    }

    #[tool(description = "Create a new directory")]
    async fn create_directory(
        &self,
        Parameters(params): Parameters<CreateDirectoryParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(handlers::create_directory(&self.sandbox, params).await)
    }

    #[tool(description = "Delete a file or directory")]
    async fn delete_file(
        &self,
        Parameters(params): Parameters<DeleteFileParams>,
    ) -> Result<CallToolResult, McpError> {
        tool_result(handlers::delete_file(&self.sandbox, params).await)
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for SandboxFsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                format!(
                    "Sandboxed filesystem server. All paths resolve inside {}; \
                     relative paths are joined onto it.",
                    self.sandbox.root().display()
                )
                .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).unwrap();
        value["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_tool_result_success() {
        let result = tool_result(Ok("done".to_string())).unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(text_of(&result), "done");
    }

    #[test]
    fn test_tool_result_error_is_content() {
        let err = Sandbox::new("/data/mv")
            .unwrap()
            .confine("../../etc")
            .unwrap_err();
        let result = tool_result(Err(err)).unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(text_of(&result).starts_with("access denied"));
    }

    #[tokio::test]
    async fn test_write_then_read_through_tools() {
        let dir = tempfile::tempdir().unwrap();
        let server = SandboxFsMcpServer::new(Sandbox::new(dir.path().to_str().unwrap()).unwrap());

        let written = server
            .write_file(Parameters(WriteFileParams {
                path: "notes/a.txt".to_string(),
                content: "hello".to_string(),
            }))
            .await
            .unwrap();
        assert!(!written.is_error.unwrap_or(false));

        let read = server
            .read_file(Parameters(ReadFileParams {
                path: "notes/a.txt".to_string(),
            }))
            .await
            .unwrap();
        assert!(!read.is_error.unwrap_or(false));
        assert_eq!(text_of(&read), "hello");
    }

    #[tokio::test]
    async fn test_denied_tool_call_is_error_result() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("root");
        std::fs::create_dir(&root).unwrap();
        let server = SandboxFsMcpServer::new(Sandbox::new(root.to_str().unwrap()).unwrap());

        let result = server
            .write_file(Parameters(WriteFileParams {
                path: "../escape.txt".to_string(),
                content: "x".to_string(),
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(text_of(&result).starts_with("access denied"));
        assert!(!outer.path().join("escape.txt").exists());

        let result = server
            .read_file(Parameters(ReadFileParams {
                path: "/etc/passwd".to_string(),
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
    }

    #[test]
    fn test_tools_registered() {
        let server = SandboxFsMcpServer::new(Sandbox::new("/data/mv").unwrap());
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "create_directory",
                "delete_file",
                "list_directory",
                "read_file",
                "write_file"
            ]
        );
    }
}
