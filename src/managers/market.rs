use crate::errors::ToolError;
use crate::managers::operations::OperationDescriptor;
use crate::services::dispatcher::Dispatcher;
use crate::services::shaper::Shaper;
use crate::services::tool_executor::ToolHandler;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Adapter for one catalog operation: arguments in, shaped payload out.
pub struct OperationHandler {
    descriptor: &'static OperationDescriptor,
    dispatcher: Dispatcher,
    shaper: Arc<Shaper>,
}

impl OperationHandler {
    pub fn new(
        descriptor: &'static OperationDescriptor,
        dispatcher: Dispatcher,
        shaper: Arc<Shaper>,
    ) -> Self {
        Self {
            descriptor,
            dispatcher,
            shaper,
        }
    }
}

#[async_trait]
impl ToolHandler for OperationHandler {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        let request = self.descriptor.build_request(&args)?;
        let raw = self.dispatcher.perform(&request).await?;
        Ok(self.shaper.shape(raw, self.descriptor.name))
    }
}
