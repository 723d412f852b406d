//! Type definitions for the sandboxed filesystem server

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::protocol::{RpcError, INTERNAL_ERROR};

// ============================================================================
// Configuration Types
// ============================================================================

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "SANDBOXFS_CONFIG";

/// Root used when neither the config file nor the CLI names one
pub const DEFAULT_ROOT: &str = "/data/mv";

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Directory every operation is confined to
    #[serde(default = "default_root")]
    pub root: String,
    /// Canonicalize existing path prefixes after the lexical check
    #[serde(default)]
    pub resolve_symlinks: bool,
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            resolve_symlinks: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name reported in the `initialize` handshake
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default)]
    pub transport: Transport,
}

fn default_server_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            transport: Transport::default(),
        }
    }
}

/// Wire adapter placed in front of the dispatcher core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Newline-delimited JSON envelopes on stdin/stdout
    #[default]
    Line,
    /// MCP over stdio via rmcp
    Mcp,
}

impl Config {
    /// Load config from standard file locations
    ///
    /// Searched in order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. `SANDBOXFS_CONFIG` env var
    /// 3. `./sandboxfs.toml`
    /// 4. `$XDG_CONFIG_HOME/sandboxfs/config.toml`
    /// 5. `~/.sandboxfs.toml`
    /// 6. Default config if none found
    ///
    /// An explicitly named file that is missing or invalid is an error;
    /// problems with the well-known locations are only logged.
    pub fn load(explicit: Option<&Path>) -> FsResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Self::from_file(&path);
            }
            tracing::warn!("{}={} does not exist", CONFIG_ENV, env_path);
        }

        let mut config_paths = vec![PathBuf::from("sandboxfs.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("sandboxfs").join("config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            config_paths.push(home.join(".sandboxfs.toml"));
        }

        for path in config_paths {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!("Skipping config {}: {}", path.display(), e),
            }
        }

        tracing::info!("Using default configuration");
        Ok(Self::default())
    }

    /// Parse a single TOML config file
    pub fn from_file(path: &Path) -> FsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FsError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config = toml::from_str::<Config>(&content)
            .map_err(|e| FsError::ConfigError(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum FsError {
    /// The resolved path falls outside the sandbox root
    #[error("access denied: path outside allowed directory {}", root.display())]
    AccessDenied { root: PathBuf },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Underlying filesystem failure; `action` names the step that failed
    #[error("Error {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl FsError {
    pub fn io(action: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| FsError::Io { action, source }
    }

    /// Map onto the protocol error object.
    ///
    /// Denials share the internal error code with I/O failures; `data.kind`
    /// tells them apart.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            FsError::AccessDenied { root } => RpcError::new(INTERNAL_ERROR, self.to_string())
                .with_data(json!({
                    "kind": "permission_denied",
                    "root": root.display().to_string(),
                })),
            FsError::InvalidPath(_) | FsError::InvalidParams(_) | FsError::UnknownOperation(_) => {
                RpcError::invalid_params(self.to_string())
            }
            FsError::Io { .. } | FsError::ConfigError(_) => {
                RpcError::new(INTERNAL_ERROR, self.to_string())
            }
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::INVALID_PARAMS;

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sandbox.root, DEFAULT_ROOT);
        assert!(!config.sandbox.resolve_symlinks);
        assert_eq!(config.server.transport, Transport::Line);
        assert_eq!(config.server.name, "sandboxfs-mcp");
    }

    #[test]
    fn test_config_parse() {
        let config: Config = toml::from_str(
            r#"
            [sandbox]
            root = "/srv/files"
            resolve_symlinks = true

            [server]
            transport = "mcp"
            "#,
        )
        .unwrap();
        assert_eq!(config.sandbox.root, "/srv/files");
        assert!(config.sandbox.resolve_symlinks);
        assert_eq!(config.server.transport, Transport::Mcp);
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/sandboxfs.toml")).unwrap_err();
        assert!(matches!(err, FsError::ConfigError(_)));
    }

    #[test]
    fn test_denial_maps_to_internal_code_with_kind() {
        let err = FsError::AccessDenied {
            root: PathBuf::from("/data/mv"),
        };
        let rpc = err.to_rpc_error();
        assert_eq!(rpc.code, INTERNAL_ERROR);
        assert_eq!(
            rpc.message,
            "access denied: path outside allowed directory /data/mv"
        );
        let data = rpc.data.unwrap();
        assert_eq!(data["kind"], "permission_denied");
        assert_eq!(data["root"], "/data/mv");
    }

    #[test]
    fn test_io_error_message_passthrough() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let err = FsError::io("reading file")(source);
        let rpc = err.to_rpc_error();
        assert_eq!(rpc.code, INTERNAL_ERROR);
        assert_eq!(rpc.message, "Error reading file: No such file");
    }

    #[test]
    fn test_request_errors_map_to_invalid_params() {
        for err in [
            FsError::InvalidParams("missing field `path`".into()),
            FsError::UnknownOperation("rename_file".into()),
            FsError::InvalidPath("Path contains null byte".into()),
        ] {
            assert_eq!(err.to_rpc_error().code, INVALID_PARAMS);
        }
    }
}
