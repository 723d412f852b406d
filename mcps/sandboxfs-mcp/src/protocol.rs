//! Wire types for the line-delimited RPC protocol
//!
//! One JSON object per line in each direction. Requests carry a method name
//! and optional params; responses echo the request id with exactly one of
//! `result` or `error`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Protocol marker written on every response
pub const PROTOCOL: &str = "2.0";

/// Version string returned by the `initialize` handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// Error codes
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Method names
pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_CAPABILITIES_LIST: &str = "capabilities/list";
pub const METHOD_OPERATIONS_INVOKE: &str = "operations/invoke";
pub const METHOD_NOTIFICATIONS_READY: &str = "notifications/ready";

/// Incoming request envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default, alias = "jsonrpc")]
    pub protocol: Option<String>,
    /// Correlation id; absent (or `null`) marks a notification
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(other),
    })
}

/// Outgoing response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub protocol: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

impl ResponseEnvelope {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            protocol: PROTOCOL,
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            protocol: PROTOCOL,
            id,
            outcome: Outcome::Error(error),
        }
    }
}

/// Error payload of a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn method_not_found() -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found")
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

/// Params of `operations/invoke`
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeParams {
    pub operation: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, Value>,
}

/// Result of a successful invocation: a list of content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResult {
    pub content: Vec<TextContent>,
}

impl InvokeResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text".to_string(),
                text: text.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_accepts_jsonrpc_alias() {
        let req: RequestEnvelope =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#).unwrap();
        assert_eq!(req.protocol.as_deref(), Some("2.0"));
        assert_eq!(req.id, Some(json!(1)));
        assert!(req.params.is_none());
    }

    #[test]
    fn test_null_and_missing_id_are_notifications() {
        let missing: RequestEnvelope =
            serde_json::from_str(r#"{"protocol":"2.0","method":"notifications/ready"}"#).unwrap();
        let null: RequestEnvelope =
            serde_json::from_str(r#"{"protocol":"2.0","id":null,"method":"x"}"#).unwrap();
        assert!(missing.id.is_none());
        assert!(null.id.is_none());
    }

    #[test]
    fn test_string_id_preserved() {
        let req: RequestEnvelope =
            serde_json::from_str(r#"{"protocol":"2.0","id":"abc","method":"x"}"#).unwrap();
        assert_eq!(req.id, Some(json!("abc")));
    }

    #[test]
    fn test_success_shape() {
        let resp = ResponseEnvelope::success(json!(7), json!({"ok": true}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({"protocol": "2.0", "id": 7, "result": {"ok": true}})
        );
    }

    #[test]
    fn test_error_shape_omits_empty_data() {
        let resp = ResponseEnvelope::failure(json!("a"), RpcError::method_not_found());
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({
                "protocol": "2.0",
                "id": "a",
                "error": {"code": -32601, "message": "Method not found"}
            })
        );
    }

    #[test]
    fn test_invoke_result_text_block() {
        let value = serde_json::to_value(InvokeResult::text("hi")).unwrap();
        assert_eq!(value, json!({"content": [{"type": "text", "text": "hi"}]}));
    }
}
