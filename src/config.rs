use crate::constants::{env, network, shaping};
use crate::errors::ConfigError;
use url::Url;

/// Process configuration, resolved once before the server starts reading stdin.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub credentials: Vec<String>,
    pub max_output_tokens: usize,
    pub timeout_ms: u64,
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub max_output_tokens: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("credentials", &format_args!("[{} redacted]", self.credentials.len()))
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = normalize_base_url(
            lookup(env::BASE_URL)
                .filter(|v| !v.trim().is_empty())
                .as_deref()
                .unwrap_or(network::DEFAULT_BASE_URL),
        )?;

        let mut credentials = Vec::new();
        for name in [env::API_KEY, env::API_KEY_ALTERNATE] {
            if let Some(value) = lookup(name) {
                credentials.push(value);
            }
        }
        if let Some(list) = lookup(env::API_KEYS) {
            credentials.extend(list.split(',').map(|s| s.to_string()));
        }
        let credentials = clean_credentials(credentials);
        if credentials.is_empty() {
            return Err(ConfigError::NoCredentials);
        }

        let max_output_tokens = parse_positive(
            env::MAX_OUTPUT_TOKENS,
            lookup(env::MAX_OUTPUT_TOKENS),
            shaping::DEFAULT_MAX_OUTPUT_TOKENS as u64,
        )? as usize;
        let timeout_ms = parse_positive(
            env::TIMEOUT_MS,
            lookup(env::TIMEOUT_MS),
            network::TIMEOUT_API_REQUEST_MS,
        )?;

        Ok(Self {
            base_url,
            credentials,
            max_output_tokens,
            timeout_ms,
        })
    }

    pub fn apply_overrides(mut self, overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        if let Some(base_url) = overrides.base_url {
            self.base_url = normalize_base_url(&base_url)?;
        }
        if let Some(tokens) = overrides.max_output_tokens.filter(|v| *v > 0) {
            self.max_output_tokens = tokens;
        }
        if let Some(timeout) = overrides.timeout_ms.filter(|v| *v > 0) {
            self.timeout_ms = timeout;
        }
        Ok(self)
    }
}

fn clean_credentials(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Paths are appended to the base verbatim, so a base with a path prefix
/// (`https://host/v1`) keeps it. Only the trailing slash is dropped.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|err| ConfigError::InvalidBaseUrl {
        value: trimmed.to_string(),
        reason: err.to_string(),
    })?;
    if !network::ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ConfigError::InvalidBaseUrl {
            value: trimmed.to_string(),
            reason: "only http and https are supported".to_string(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn parse_positive(name: &str, raw: Option<String>, fallback: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(fallback);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            name: name.to_string(),
            value: raw,
        }),
    }
}
