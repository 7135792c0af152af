//! Host command - serve the review tools to an agent runtime over stdio
//!
//! Each stdin line is a request `{"tool": "<name>", "args": {...}}`; each
//! request gets exactly one line of JSON on stdout. The review server runs in
//! the same process, so review URLs handed to the agent open immediately.

use clap::Args;
use fleet_core::{Config, ToolRegistry};
use fleet_server::ReviewServer;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Run the review server and answer tool calls read from stdin
#[derive(Args, Debug)]
pub struct HostArgs {}

#[derive(Debug, Deserialize)]
struct ToolRequest {
    tool: String,
    #[serde(default = "empty_args")]
    args: Value,
}

fn empty_args() -> Value {
    json!({})
}

impl HostArgs {
    /// Execute the host command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let server = ReviewServer::new(config.clone()).start().await?;
        let registry = ToolRegistry::document_review(server.service());
        tracing::info!(url = %server.url(), tools = ?registry.names(), "Tool host ready");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let result = handle_line(&registry, &line).await;
            stdout.write_all(result.to_string().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        server.stop().await?;
        Ok(())
    }
}

async fn handle_line(registry: &ToolRegistry, line: &str) -> Value {
    match serde_json::from_str::<ToolRequest>(line) {
        Ok(request) => registry.call_value(&request.tool, request.args).await,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed tool request");
            json!({ "error": format!("Invalid request: {}", e) })
        }
    }
}
