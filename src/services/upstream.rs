use crate::constants::network;
use crate::errors::UpstreamError;
use crate::services::credential_pool::Credential;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// One logical upstream call: verb, path relative to the base URL and query
/// pairs in the order the tool declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Performs a single attempt with a single credential. Failover lives in the
/// dispatcher, not here.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn send(
        &self,
        credential: &Credential,
        request: &UpstreamRequest,
    ) -> Result<Value, UpstreamError>;
}

pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
    max_body_bytes: usize,
    clients: Mutex<HashMap<String, Client>>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(timeout_ms),
            max_body_bytes: network::MAX_RESPONSE_BYTES,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One client per credential, built on first use and reused afterwards so
    /// connection pools survive across calls.
    fn client_for(&self, credential: &Credential) -> Result<Client, UpstreamError> {
        let mut guard = self
            .clients
            .lock()
            .map_err(|_| UpstreamError::Setup("HTTP client cache is poisoned".to_string()))?;
        if let Some(existing) = guard.get(credential.expose()) {
            return Ok(existing.clone());
        }

        let mut key = HeaderValue::from_str(credential.expose()).map_err(|_| {
            UpstreamError::Setup("API key contains characters not allowed in a header".to_string())
        })?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(network::API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|err| UpstreamError::Setup(format!("Failed to build HTTP client: {}", err)))?;
        guard.insert(credential.expose().to_string(), client.clone());
        Ok(client)
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn send(
        &self,
        credential: &Credential,
        request: &UpstreamRequest,
    ) -> Result<Value, UpstreamError> {
        let client = self.client_for(credential)?;
        let mut builder = client.request(request.method.clone(), self.url_for(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = read_body(response, self.max_body_bytes).await?;

        if !status.is_success() {
            return Err(UpstreamError::http(status, body));
        }
        Ok(body)
    }
}

/// Reads at most `max_bytes`; a body larger than that is a broken response
/// for this API, not something to relay.
async fn read_body(response: reqwest::Response, max_bytes: usize) -> Result<Value, UpstreamError> {
    let status = response.status().as_u16();
    let mut buffer = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buffer.len() + chunk.len() > max_bytes {
            return Err(UpstreamError::BodyTooLarge {
                status,
                limit: max_bytes,
            });
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(decode_body(&buffer))
}

/// JSON when it parses, otherwise the raw text as a JSON string.
pub(crate) fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).to_string()))
}
