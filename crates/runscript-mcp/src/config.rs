//! Command-line options and host defaults

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use runscript_core::{Defaults, PLATFORM_SHELL};

/// MCP server that runs scripts on this machine
#[derive(Debug, Parser)]
#[command(name = "runscript-mcp")]
#[command(about = "MCP server for running scripts through a local interpreter", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Port for the HTTP (event-stream) transport. Uses stdio when omitted.
    #[arg(long)]
    pub sse_port: Option<u16>,

    /// Address the HTTP transport binds to
    #[arg(long, default_value = "127.0.0.1")]
    pub sse_host: String,
}

impl Cli {
    /// Socket address for the HTTP transport, if one was requested
    pub fn http_addr(&self) -> anyhow::Result<Option<SocketAddr>> {
        let Some(port) = self.sse_port else {
            return Ok(None);
        };
        let addr = format!("{}:{}", self.sse_host, port).parse()?;
        Ok(Some(addr))
    }
}

/// Facts about the host, looked up once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDefaults {
    /// Operating system family, e.g. `linux`
    pub os: &'static str,
    /// Name of the user the server runs as
    pub username: String,
    /// Shell offered as the default interpreter
    pub shell: String,
    /// Home directory, if it could be determined
    pub home_dir: Option<PathBuf>,
}

impl HostDefaults {
    /// Read the current user and home directory from the environment
    pub fn detect() -> Self {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            os: std::env::consts::OS,
            username,
            shell: PLATFORM_SHELL.to_string(),
            home_dir: dirs::home_dir(),
        }
    }

    /// Home directory for display, `unknown` when absent
    pub fn home_display(&self) -> String {
        self.home_dir
            .as_ref()
            .map_or_else(|| "unknown".to_string(), |p| p.display().to_string())
    }
}

impl From<&HostDefaults> for Defaults {
    fn from(host: &HostDefaults) -> Self {
        Self {
            interpreter: host.shell.clone(),
            working_dir: host.home_dir.clone(),
        }
    }
}
