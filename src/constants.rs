pub mod server {
    pub const NAME: &str = "indian-stock-market";
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const LOG_CONTEXT: &str = "stock-mcp";
}

pub mod network {
    pub const DEFAULT_BASE_URL: &str = "https://api.indianstocks.com";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const API_KEY_HEADER: &str = "x-api-key";
    pub const MAX_RESPONSE_BYTES: usize = 32 * 1024 * 1024;
    pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];
}

pub mod env {
    pub const BASE_URL: &str = "INDIAN_STOCK_API_BASE_URL";
    pub const API_KEY: &str = "INDIAN_STOCK_API_KEY";
    pub const API_KEY_ALTERNATE: &str = "INDIAN_STOCK_API_KEY_ALTERNATE";
    pub const API_KEYS: &str = "INDIAN_STOCK_API_KEYS";
    pub const MAX_OUTPUT_TOKENS: &str = "STOCK_MCP_MAX_OUTPUT_TOKENS";
    pub const TIMEOUT_MS: &str = "STOCK_MCP_TIMEOUT_MS";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

pub mod shaping {
    pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 20_000;
    pub const CHARS_PER_TOKEN: usize = 4;
    pub const DETAIL_INFO_MAX_CHARS: usize = 500;
    pub const SERIES_TAIL_POINTS: usize = 100;
    pub const STATEMENT_MAX_ROWS: usize = 10;
    pub const NEWS_MAX_ITEMS: usize = 15;
    pub const NEWS_DESCRIPTION_MAX_CHARS: usize = 300;
    pub const LIST_MAX_ITEMS: usize = 20;
    pub const SUMMARY_SAMPLE_ITEMS: usize = 5;
    pub const SUMMARY_MAX_KEYS: usize = 50;
    pub const ELLIPSIS: &str = "...";
}
