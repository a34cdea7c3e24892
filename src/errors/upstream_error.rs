use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// A failed upstream call, classified by how far the request got.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The API answered with a non-2xx status.
    #[error("API Error: {status} - {status_text}")]
    Http {
        status: u16,
        status_text: String,
        body: Value,
    },

    /// The request went out but no (complete) response came back.
    #[error("No response received from API: {0}")]
    Unreachable(String),

    /// A response arrived but its body exceeded the read cap.
    #[error("Response body too large: exceeded {limit} bytes")]
    BodyTooLarge { status: u16, limit: usize },

    /// The request could not be built or sent at all.
    #[error("Request setup error: {0}")]
    Setup(String),
}

impl UpstreamError {
    pub fn http(status: StatusCode, body: Value) -> Self {
        Self::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for the one status the dispatcher fails over on.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS.as_u16())
    }

    /// Message shown to the host in the error body.
    pub fn host_message(&self) -> String {
        match self {
            Self::Http { .. } => self.to_string(),
            Self::Unreachable(_) => "No response received from API".to_string(),
            Self::BodyTooLarge { .. } => "Response body too large".to_string(),
            Self::Setup(_) => "Request setup error".to_string(),
        }
    }

    pub fn details(&self) -> Value {
        match self {
            Self::Http { body, .. } => body.clone(),
            Self::Unreachable(message) | Self::Setup(message) => Value::String(message.clone()),
            Self::BodyTooLarge { status, limit } => serde_json::json!({
                "status": status,
                "limit_bytes": limit,
            }),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::Setup(err.to_string());
        }
        if err.is_timeout() {
            return Self::Unreachable(format!("HTTP request timed out: {}", err));
        }
        Self::Unreachable(err.to_string())
    }
}
