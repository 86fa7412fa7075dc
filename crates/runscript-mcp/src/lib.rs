//! Runscript MCP Server - Model Context Protocol server for running scripts
//!
//! This crate exposes a single tool that lets an AI agent run a script on the
//! host. The script body is written to a private temporary file, executed by
//! the chosen interpreter with a 30 second deadline, and the captured stdout
//! and stderr come back as text.
//!
//! ## Tool
//!
//! `execute_comand_line_script` takes:
//! - `content` - script body (required)
//! - `interpreter` - interpreter path (default: the platform shell)
//! - `working_dir` - directory to run in (default: the user's home)

pub mod config;
pub mod tools;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use runscript_core::{Defaults, Report, ScriptExecutor};

use crate::config::HostDefaults;
use crate::tools::script::ExecuteScriptArgs;

// Re-export for binary
pub use rmcp;

/// The Runscript MCP service
///
/// Cheap to clone: the executor is shared and holds no per-call state, so
/// every session and every concurrent call can use the same instance.
#[derive(Clone)]
pub struct RunscriptMcpService {
    executor: Arc<ScriptExecutor>,
    host: Arc<HostDefaults>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RunscriptMcpService {
    /// Create a service whose defaults come from `host`
    pub fn new(host: HostDefaults) -> Self {
        let executor = ScriptExecutor::new(Defaults::from(&host));
        Self::with_executor(host, executor)
    }

    /// Create a service around a preconfigured executor
    pub fn with_executor(host: HostDefaults, executor: ScriptExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            host: Arc::new(host),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "execute_comand_line_script",
        description = "Execute a command line script on the user's system. The script is written to a temporary file and run by the given interpreter with a 30 second timeout. Returns captured stdout under \"Output:\", stderr under \"Errors:\", and an \"Execution error:\" line if the script failed."
    )]
    async fn execute_script(
        &self,
        params: Parameters<ExecuteScriptArgs>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = params.0.0;
        let report = self.executor.execute(&arguments).await;
        Ok(into_call_result(report))
    }

    fn instructions(&self) -> String {
        let defaults = self.executor.defaults();
        format!(
            "Runscript MCP server for executing scripts on the host.\n\n\
             Host: {} OS, current user: {}.\n\
             Default interpreter: {}. Default working directory: {}.\n\
             Scripts are killed after {} seconds; output from a killed script is not returned.",
            self.host.os,
            self.host.username,
            defaults.interpreter,
            self.host.home_display(),
            self.executor.timeout().as_secs(),
        )
    }
}

fn into_call_result(report: Report) -> CallToolResult {
    let content = vec![Content::text(report.text)];
    if report.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

#[tool_handler]
impl ServerHandler for RunscriptMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "runscript-mcp".to_string(),
                title: Some("Script Tool".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(self.instructions()),
        }
    }
}
