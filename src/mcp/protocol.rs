use crate::errors::McpError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Requests without an id expect no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code: error.code.as_i32(),
                message: error.message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn notification_has_no_id() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert!(parsed.is_notification());
        assert!(parsed.params.is_null());
    }

    #[test]
    fn tools_call_keeps_params() {
        let raw = r#"{"jsonrpc":"2.0","id":"abc","method":"tools/call","params":{"name":"get_ipo_data"}}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert_eq!(parsed.id, Some(Value::String("abc".to_string())));
        assert_eq!(parsed.params["name"], "get_ipo_data");
    }

    #[test]
    fn failure_serializes_code_without_result() {
        let response = JsonRpcResponse::failure(
            Value::from(7),
            McpError::new(ErrorCode::MethodNotFound, "Method not found: x"),
        );
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["error"]["code"], -32601);
        assert!(wire.get("result").is_none());
        assert_eq!(wire["jsonrpc"], "2.0");
    }
}
