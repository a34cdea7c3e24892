#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};
use stock_mcp::app::App;
use stock_mcp::config::Settings;
use stock_mcp::errors::UpstreamError;
use stock_mcp::services::credential_pool::Credential;
use stock_mcp::services::logger::{LogLevel, Logger};
use stock_mcp::services::upstream::{UpstreamRequest, UpstreamTransport};
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// One attempt as the transport saw it.
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub key: String,
    pub request: UpstreamRequest,
}

/// Replays scripted outcomes in order; once the script runs out every call
/// succeeds with `fallback`.
pub struct FakeTransport {
    script: StdMutex<VecDeque<Result<Value, UpstreamError>>>,
    fallback: Value,
    calls: StdMutex<Vec<SeenCall>>,
}

impl FakeTransport {
    pub fn new(script: Vec<Result<Value, UpstreamError>>) -> Arc<Self> {
        Self::with_fallback(script, serde_json::json!({"ok": true}))
    }

    pub fn with_fallback(script: Vec<Result<Value, UpstreamError>>, fallback: Value) -> Arc<Self> {
        Arc::new(Self {
            script: StdMutex::new(script.into()),
            fallback,
            calls: StdMutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<SeenCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.key).collect()
    }
}

#[async_trait]
impl UpstreamTransport for FakeTransport {
    async fn send(
        &self,
        credential: &Credential,
        request: &UpstreamRequest,
    ) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(SeenCall {
            key: credential.expose().to_string(),
            request: request.clone(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

pub fn rate_limited() -> Result<Value, UpstreamError> {
    Err(UpstreamError::http(
        StatusCode::TOO_MANY_REQUESTS,
        serde_json::json!({"message": "quota exceeded"}),
    ))
}

pub fn settings(keys: &[&str]) -> Settings {
    Settings {
        base_url: "http://stocks.test".to_string(),
        credentials: keys.iter().map(|k| k.to_string()).collect(),
        max_output_tokens: 20_000,
        timeout_ms: 1_000,
    }
}

pub fn quiet_logger() -> Logger {
    Logger::new("test").with_level(LogLevel::Error)
}

pub fn app_with(keys: &[&str], transport: Arc<FakeTransport>) -> App {
    App::with_transport(&settings(keys), transport, quiet_logger()).expect("app must build")
}
