use crate::errors::ToolError;
use crate::services::shaper::render;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// The only shape a tool call ever returns to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(payload: &Value) -> Self {
        Self {
            content: vec![ContentBlock::text(render(payload))],
            is_error: false,
        }
    }

    pub fn failure(error: &ToolError) -> Self {
        Self {
            content: vec![ContentBlock::text(render(&error.to_body()))],
            is_error: true,
        }
    }

    /// Text of the single content block parsed back as JSON.
    pub fn json(&self) -> Option<Value> {
        let block = self.content.first()?;
        serde_json::from_str(&block.text).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_is_pretty_printed_json() {
        let result = ToolResult::success(&json!({"a": 1}));
        assert!(!result.is_error);
        assert_eq!(result.content[0].text, "{\n  \"a\": 1\n}");
        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["content"][0]["type"], "text");
        assert_eq!(wire["isError"], false);
    }

    #[test]
    fn failure_carries_error_body() {
        let result = ToolResult::failure(&ToolError::invalid_params("bad"));
        assert!(result.is_error);
        let body = result.json().unwrap();
        assert_eq!(body, json!({"error": true, "message": "bad"}));
    }
}
