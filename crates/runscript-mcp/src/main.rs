//! Runscript MCP Server Binary
//!
//! Runs the Runscript MCP server on stdio, or on streamable HTTP when
//! `--sse-port` is given.
//!
//! ## Usage
//!
//! Run directly:
//! ```bash
//! runscript-mcp
//! runscript-mcp --sse-port 8080
//! ```
//!
//! Or add to an MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "script": {
//!       "command": "runscript-mcp"
//!     }
//!   }
//! }
//! ```

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use tracing::info;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use runscript_mcp::RunscriptMcpService;
use runscript_mcp::config::{Cli, HostDefaults};

#[tokio::main]
async fn main() -> Result<()> {
    // CRITICAL: Log to stderr only - stdout is reserved for MCP JSON-RPC
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Host lookups happen once here; calls only ever see the injected defaults.
    let host = HostDefaults::detect();
    info!(
        os = host.os,
        user = %host.username,
        home = %host.home_display(),
        "Runscript MCP server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service = RunscriptMcpService::new(host);

    match cli.http_addr()? {
        Some(addr) => serve_http(service, addr).await,
        None => serve_stdio(service).await,
    }
}

async fn serve_stdio(service: RunscriptMcpService) -> Result<()> {
    info!("Ready. Listening on stdio...");
    let server = service.serve(stdio()).await?;

    // Wait for client to disconnect or error
    server.waiting().await?;

    info!("Client disconnected. Shutting down.");
    Ok(())
}

async fn serve_http(service: RunscriptMcpService, addr: SocketAddr) -> Result<()> {
    let http = StreamableHttpService::new(
        move || Ok(service.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", http);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Ready. Listening on http://{}/mcp", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Shutting down.");
    Ok(())
}
