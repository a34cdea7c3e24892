use thiserror::Error;

/// Startup failures. Any of these stops the process before the first request
/// is read from the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No API keys found in environment variables (set INDIAN_STOCK_API_KEY or INDIAN_STOCK_API_KEY_ALTERNATE)")]
    NoCredentials,

    #[error("Invalid base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("Invalid value for {name}: '{value}' (expected a positive integer)")]
    InvalidNumber { name: String, value: String },

    /// A catalog tool without an upstream operation, or the reverse.
    #[error("Tool wiring is incomplete: {}", missing.join(", "))]
    IncompleteWiring { missing: Vec<String> },
}
