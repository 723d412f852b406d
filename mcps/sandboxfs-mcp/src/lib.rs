//! Sandboxed filesystem server
//!
//! Exposes read/write/list/mkdir/delete over a line-delimited JSON RPC
//! protocol, confining every path to a single root directory.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use sandboxfs_mcp::{Dispatcher, Sandbox};
//!
//! let dispatcher = Dispatcher::new(Sandbox::new("/data/mv")?);
//! let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//! dispatcher.serve(stdin, tokio::io::stdout()).await?;
//! ```
//!
//! The same handlers are also served as MCP tools by [`SandboxFsMcpServer`].

pub mod catalog;
pub mod dispatcher;
pub mod handlers;
pub mod init;
pub mod params;
pub mod protocol;
pub mod sandbox;
pub mod server;
pub mod types;

pub use dispatcher::Dispatcher;
pub use init::init_tracing;
pub use sandbox::{ConfinedPath, Sandbox};
pub use server::SandboxFsMcpServer;
pub use types::{Config, FsError, FsResult, Transport};

// Re-export parameter types for direct API usage
pub use params::*;
