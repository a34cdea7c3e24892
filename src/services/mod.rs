pub mod credential_pool;
pub mod dispatcher;
pub mod logger;
pub mod shaper;
pub mod tool_executor;
pub mod upstream;
