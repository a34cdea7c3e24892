use crate::app::App;
use crate::config::Settings;
use crate::constants::server::{NAME as SERVER_NAME, PROTOCOL_VERSION, VERSION as SERVER_VERSION};
use crate::errors::{ConfigError, ErrorCode, McpError};
use crate::mcp::catalog::list_tools;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::services::logger::Logger;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("stdio failure: {0}")]
    Io(#[from] std::io::Error),
}

pub struct McpServer {
    app: Arc<App>,
    logger: Logger,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        let logger = app.logger.child("server");
        Self { app, logger }
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        list_tools()
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| McpError::new(ErrorCode::InvalidParams, "Missing tool name"))?;
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);

        let result = self.app.tool_executor.execute(name, args).await;
        serde_json::to_value(result)
            .map_err(|err| McpError::new(ErrorCode::InternalError, err.to_string()))
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Notifications are never answered, not even with an error.
        let id = request.id?;
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                McpError::new(ErrorCode::InvalidRequest, "Invalid request"),
            ));
        }

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" | "notifications/initialized" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(&request.params).await,
            other => Err(McpError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::failure(id, err),
        })
    }

    /// Handles one line of the stdio stream. Blank lines and notifications
    /// produce nothing.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parsed: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    McpError::new(ErrorCode::ParseError, "Parse error"),
                ))
            }
        };
        let id = parsed.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(parsed) {
            Ok(request) => self.handle_request(request).await,
            Err(_) => Some(JsonRpcResponse::failure(
                id,
                McpError::new(ErrorCode::InvalidRequest, "Invalid request"),
            )),
        }
    }

    /// Reads requests until EOF. Every line is handled on its own task so a
    /// slow upstream call never blocks `ping` or another call; responses go
    /// through a single writer task to keep lines whole.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(run_write_loop(writer, rx));

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some(response) = server.handle_line(&line).await else {
                    return;
                };
                match serde_json::to_string(&response) {
                    Ok(payload) => {
                        let _ = tx.send(payload);
                    }
                    Err(err) => server.logger.error(
                        "Failed to encode response",
                        Some(&serde_json::json!({"error": err.to_string()})),
                    ),
                }
            });
        }

        // In-flight calls hold sender clones; the writer drains until the last one finishes.
        drop(tx);
        match writer_task.await {
            Ok(result) => result.map_err(ServerError::from),
            Err(err) => Err(ServerError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                err.to_string(),
            ))),
        }
    }
}

async fn run_write_loop<W>(writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    while let Some(payload) = rx.recv().await {
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

pub async fn run_stdio(settings: &Settings) -> Result<(), ServerError> {
    let app = App::initialize(settings)?;
    let server = Arc::new(McpServer::new(Arc::new(app)));
    server.logger.info("listening on stdio", None);
    server
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await
}
