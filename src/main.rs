use clap::Parser;
use stock_mcp::config::{Settings, SettingsOverrides};
use stock_mcp::mcp::catalog::list_tools;

/// MCP server over stdio for the Indian stock market API.
#[derive(Debug, Parser)]
#[command(name = "stock-market-mcp", version)]
struct Cli {
    /// Upstream base URL; overrides INDIAN_STOCK_API_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Token ceiling for a single tool result.
    #[arg(long)]
    max_output_tokens: Option<usize>,

    /// Per-request upstream timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the tool catalog as JSON and exit.
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.list_tools {
        match serde_json::to_string_pretty(&list_tools()) {
            Ok(catalog) => println!("{}", catalog),
            Err(err) => {
                eprintln!("stock-market-mcp: {}", err);
                std::process::exit(1);
            }
        }
        return;
    }

    let overrides = SettingsOverrides {
        base_url: cli.base_url,
        max_output_tokens: cli.max_output_tokens,
        timeout_ms: cli.timeout_ms,
    };
    let settings = match Settings::from_env().and_then(|s| s.apply_overrides(overrides)) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("stock-market-mcp: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = stock_mcp::mcp::server::run_stdio(&settings).await {
        eprintln!("stock-market-mcp: {}", err);
        std::process::exit(1);
    }
}
