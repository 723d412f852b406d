//! Request dispatcher for the line-delimited protocol
//!
//! Reads one envelope per line, routes it by method name and writes at most
//! one response line back. Requests are handled strictly one after another.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::catalog::{self, Operation};
use crate::handlers;
use crate::protocol::*;
use crate::sandbox::Sandbox;
use crate::types::{FsError, FsResult};

/// Routes decoded requests onto the sandboxed operations
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sandbox: Sandbox,
    server_name: String,
}

impl Dispatcher {
    pub fn new(sandbox: Sandbox) -> Self {
        Self {
            sandbox,
            server_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Serve requests from `reader` until end of input
    ///
    /// Blank lines are ignored; lines that do not decode as a request are
    /// logged and skipped. Only I/O failures on the streams end the loop
    /// early.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let Some(response) = self.handle_line(&buf).await else {
                continue;
            };

            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }

        tracing::info!("End of input, stopping");
        Ok(())
    }

    async fn handle_line(&self, raw: &[u8]) -> Option<ResponseEnvelope> {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                tracing::warn!("Skipping non-UTF-8 request line: {}", e);
                return None;
            }
        };
        if line.is_empty() {
            return None;
        }

        let value = match serde_json::from_str::<Value>(line) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                tracing::warn!("Skipping request line that is not a JSON object");
                return None;
            }
            Err(e) => {
                tracing::warn!("Skipping malformed request: {}", e);
                return None;
            }
        };

        // An envelope that still carries an id is answered even when the
        // rest of it does not decode.
        let id = value.get("id").filter(|id| !id.is_null()).cloned();
        match serde_json::from_value::<RequestEnvelope>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::warn!("Malformed envelope: {}", e);
                id.map(|id| ResponseEnvelope::failure(id, RpcError::method_not_found()))
            }
        }
    }

    /// Handle one request; `None` means nothing is sent back
    pub async fn handle(&self, request: RequestEnvelope) -> Option<ResponseEnvelope> {
        tracing::debug!(method = %request.method, id = ?request.id, "Handling request");

        if request.method == METHOD_NOTIFICATIONS_READY {
            tracing::debug!("Client ready");
            return None;
        }

        let outcome = self.route(&request.method, request.params).await;

        let Some(id) = request.id else {
            if let Err(e) = &outcome {
                tracing::debug!("Dropping error for notification: {}", e.message);
            }
            return None;
        };

        Some(match outcome {
            Ok(result) => ResponseEnvelope::success(id, result),
            Err(error) => ResponseEnvelope::failure(id, error),
        })
    }

    async fn route(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        match method {
            METHOD_INITIALIZE => Ok(self.initialize()),
            METHOD_CAPABILITIES_LIST => Ok(json!({ "operations": catalog::descriptors() })),
            METHOD_OPERATIONS_INVOKE => {
                let result = self.invoke(params).await.map_err(|e| {
                    match &e {
                        FsError::AccessDenied { .. } => tracing::warn!("{}", e),
                        _ => tracing::debug!("Invocation failed: {}", e),
                    }
                    e.to_rpc_error()
                })?;
                serde_json::to_value(result)
                    .map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
            }
            _ => Err(RpcError::method_not_found()),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "operations": {} },
            "serverInfo": {
                "name": self.server_name,
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    /// Run one `operations/invoke` request
    pub async fn invoke(&self, params: Option<Value>) -> FsResult<InvokeResult> {
        let params = params
            .ok_or_else(|| FsError::InvalidParams("missing `operation` and `arguments`".into()))?;
        let InvokeParams {
            operation,
            arguments,
        } = serde_json::from_value(params).map_err(|e| FsError::InvalidParams(e.to_string()))?;

        let op: Operation = operation.parse()?;
        let arguments = Value::Object(arguments);
        let sandbox = &self.sandbox;

        let text = match op {
            Operation::ReadFile => handlers::read_file(sandbox, decode(op, arguments)?).await?,
            Operation::WriteFile => handlers::write_file(sandbox, decode(op, arguments)?).await?,
            Operation::ListDirectory => {
                handlers::list_directory(sandbox, decode(op, arguments)?).await?
            }
            Operation::CreateDirectory => {
                handlers::create_directory(sandbox, decode(op, arguments)?).await?
            }
            Operation::DeleteFile => handlers::delete_file(sandbox, decode(op, arguments)?).await?,
        };

        Ok(InvokeResult::text(text))
    }
}

fn decode<T: DeserializeOwned>(op: Operation, arguments: Value) -> FsResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| FsError::InvalidParams(format!("{}: {}", op.name(), e)))
}
