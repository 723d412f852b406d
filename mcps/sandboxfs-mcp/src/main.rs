//! sandboxfs-mcp - sandboxed filesystem server
//!
//! Serves the line protocol on stdin/stdout by default, or MCP with
//! `--transport mcp`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;

use sandboxfs_mcp::{init_tracing, Config, Dispatcher, Sandbox, SandboxFsMcpServer, Transport};

#[derive(Parser)]
#[command(name = "sandboxfs-mcp")]
#[command(about = "Sandboxed filesystem server for tool-using agents")]
struct Cli {
    /// Config file (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory every operation is confined to
    #[arg(long, env = "SANDBOXFS_ROOT")]
    root: Option<String>,

    /// Wire protocol to serve on stdio
    #[arg(long, value_enum)]
    transport: Option<Transport>,

    /// Reject paths that escape the root through symlinks
    #[arg(long)]
    resolve_symlinks: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("sandboxfs_mcp")?;

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.sandbox.root = root;
    }
    if let Some(transport) = cli.transport {
        config.server.transport = transport;
    }
    if cli.resolve_symlinks {
        config.sandbox.resolve_symlinks = true;
    }

    let sandbox = Sandbox::from_config(&config.sandbox)?;
    tracing::info!(
        root = %sandbox.root().display(),
        transport = ?config.server.transport,
        "Starting sandboxfs server"
    );

    match config.server.transport {
        Transport::Line => {
            let dispatcher = Dispatcher::new(sandbox).with_server_name(config.server.name);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            dispatcher.serve(stdin, tokio::io::stdout()).await?;
        }
        Transport::Mcp => {
            let service = SandboxFsMcpServer::new(sandbox)
                .serve(rmcp::transport::stdio())
                .await?;
            tracing::info!("Server running, waiting for requests...");
            service.waiting().await?;
        }
    }

    tracing::info!("Server shutting down");
    Ok(())
}
