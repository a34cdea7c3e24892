use crate::config::Settings;
use crate::constants::server;
use crate::errors::ConfigError;
use crate::managers::market::OperationHandler;
use crate::managers::operations::{operation_by_name, OPERATIONS};
use crate::mcp::catalog::tool_catalog;
use crate::services::credential_pool::CredentialPool;
use crate::services::dispatcher::Dispatcher;
use crate::services::logger::Logger;
use crate::services::shaper::Shaper;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::upstream::{HttpTransport, UpstreamTransport};
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub dispatcher: Dispatcher,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    /// Every catalog tool needs an upstream operation and every operation a
    /// catalog entry; a mismatch is a build mistake, caught at startup.
    fn validate_tool_wiring() -> Result<(), ConfigError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| operation_by_name(&tool.name).is_none())
            .map(|tool| tool.name.clone())
            .collect();
        missing.extend(
            OPERATIONS
                .iter()
                .filter(|op| !tool_catalog().iter().any(|tool| tool.name == op.name))
                .map(|op| op.name.to_string()),
        );
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ConfigError::IncompleteWiring { missing })
    }

    pub fn initialize(settings: &Settings) -> Result<Self, ConfigError> {
        let transport = Arc::new(HttpTransport::new(
            settings.base_url.clone(),
            settings.timeout_ms,
        ));
        Self::with_transport(settings, transport, Logger::new(server::LOG_CONTEXT))
    }

    pub fn with_transport(
        settings: &Settings,
        transport: Arc<dyn UpstreamTransport>,
        logger: Logger,
    ) -> Result<Self, ConfigError> {
        Self::validate_tool_wiring()?;

        let pool = Arc::new(CredentialPool::new(settings.credentials.iter().cloned())?);
        let dispatcher = Dispatcher::new(logger.clone(), pool.clone(), transport);
        let shaper = Arc::new(Shaper::new(settings.max_output_tokens));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for descriptor in OPERATIONS.iter() {
            handlers.insert(
                descriptor.name.to_string(),
                Arc::new(OperationHandler::new(
                    descriptor,
                    dispatcher.clone(),
                    shaper.clone(),
                )),
            );
        }
        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        logger.info(
            "initialized",
            Some(&serde_json::json!({
                "base_url": settings.base_url,
                "api_keys": pool.len(),
                "tools": OPERATIONS.len(),
                "max_output_tokens": settings.max_output_tokens,
                "timeout_ms": settings.timeout_ms,
            })),
        );

        Ok(Self {
            logger,
            dispatcher,
            tool_executor,
        })
    }
}
