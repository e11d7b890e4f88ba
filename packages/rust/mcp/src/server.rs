//! Newline-delimited JSON-RPC server over stdio.
//!
//! One request per line in, one response per line out. stdout carries
//! protocol traffic only; logs go to stderr.

use docbridge_shared::{DocBridgeError, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, instrument, warn};

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, ToolCallParams,
};
use crate::tools::ToolRouter;

/// Server name reported from `initialize`.
pub const SERVER_NAME: &str = "docbridge";

/// Usage guidance handed to the assistant on `initialize`.
const INSTRUCTIONS: &str = "\
You can search and read the product documentation through these tools.

1. For any question about the product, call search_deployment first, then get_content for the most relevant result.
2. Always include the portal URLs from responses in your answer, formatted as:
   📄 Document Title: URL
3. Prefer the quick_answer and smart_snippet fields when they answer the question directly.
4. When a search returns nothing, try the did_you_mean suggestions.";

pub struct McpServer {
    router: ToolRouter,
}

impl McpServer {
    pub fn new(router: ToolRouter) -> Self {
        Self { router }
    }

    /// Handle one raw input line. Blank lines and notifications produce no
    /// response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                return Some(parse_error(e));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "malformed request");
                Some(JsonRpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("invalid request: {e}"),
                ))
            }
        }
    }

    #[instrument(skip_all, fields(method = %request.method))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() || request.method.starts_with("notifications/") {
            debug!("notification received");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                "invalid json-rpc version",
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                JsonRpcResponse::success(id, json!({ "tools": self.router.definitions() }))
            }
            "tools/call" => self.call_tool(id, request.params).await,
            other => {
                debug!("unknown method");
                JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("method not found: {other}"))
            }
        };

        Some(response)
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::failure(
                    id,
                    INVALID_PARAMS,
                    format!("invalid tools/call params: {e}"),
                );
            }
        };

        let arguments = params.arguments.unwrap_or_default();
        let result = self.router.call(&params.name, &arguments).await;

        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    /// Serve until `reader` reaches end of input. A line that is not valid
    /// UTF-8 gets a parse error and the loop continues.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| DocBridgeError::io("<stdin>", e))?;
            if read == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => self.handle_line(line).await,
                Err(e) => {
                    warn!(error = %e, "request line is not valid UTF-8");
                    Some(parse_error(e))
                }
            };

            if let Some(response) = response {
                write_response(&mut writer, &response).await?;
            }
        }

        info!("input closed, shutting down");
        Ok(())
    }
}

fn parse_error(err: impl std::fmt::Display) -> JsonRpcResponse {
    JsonRpcResponse::failure(Value::Null, PARSE_ERROR, format!("parse error: {err}"))
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(response)
        .map_err(|e| DocBridgeError::parse(format!("failed to encode response: {e}")))?;
    json.push('\n');
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| DocBridgeError::io("<stdout>", e))?;
    writer
        .flush()
        .await
        .map_err(|e| DocBridgeError::io("<stdout>", e))
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "instructions": INSTRUCTIONS,
    })
}

/// Run the tool server on this process's stdin and stdout.
pub async fn serve_stdio(router: ToolRouter) -> Result<()> {
    info!(
        portal = router.portal().is_configured(),
        "tool server listening on stdio"
    );
    McpServer::new(router)
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
