use crate::errors::ToolError;
use crate::mcp::catalog::{normalize_args, unknown_tool_error, validate_tool_args};
use crate::mcp::envelope::ToolResult;
use crate::services::logger::Logger;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

/// Routes a tool call to its handler and turns every outcome into a
/// `ToolResult`. Nothing below this point reaches the host as a fault.
#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_handler(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub async fn execute(&self, tool: &str, raw_args: Value) -> ToolResult {
        let call_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let outcome = self.run(tool, raw_args).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(payload) => {
                self.logger.info(
                    "tool call completed",
                    Some(&serde_json::json!({
                        "call_id": call_id,
                        "tool": tool,
                        "duration_ms": duration_ms,
                    })),
                );
                ToolResult::success(&payload)
            }
            Err(err) => {
                self.logger.warn(
                    "tool call failed",
                    Some(&serde_json::json!({
                        "call_id": call_id,
                        "tool": tool,
                        "kind": err.kind,
                        "message": err.message,
                        "duration_ms": duration_ms,
                    })),
                );
                ToolResult::failure(&err)
            }
        }
    }

    async fn run(&self, tool: &str, raw_args: Value) -> Result<Value, ToolError> {
        let handler = self
            .handlers
            .get(tool)
            .cloned()
            .ok_or_else(|| unknown_tool_error(tool))?;
        let args = normalize_args(raw_args);
        validate_tool_args(tool, &args)?;
        handler.handle(args).await
    }
}
