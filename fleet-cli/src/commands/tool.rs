//! Tool commands - run one review tool, or list them

use anyhow::Context;
use clap::Args;
use fleet_core::{Config, ReviewService, ServerConfig, ToolRegistry};
use fleet_store::ReviewStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Run a single review tool against the local review store
#[derive(Args, Debug)]
pub struct ToolArgs {
    /// Tool name (see `openfleet tools`)
    pub name: String,

    /// Tool arguments as a JSON object
    pub args: Option<String>,
}

impl ToolArgs {
    /// Execute the tool command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let args: Value = match &self.args {
            Some(raw) => serde_json::from_str(raw).context("Tool arguments must be JSON")?,
            None => json!({}),
        };

        let server = &config.server;
        let url = match locate_server(server.port, server.max_port_attempts).await {
            Some(url) => url,
            None => {
                let url = ServerConfig::base_url(server.port);
                tracing::warn!(
                    url = %url,
                    attempts = server.max_port_attempts,
                    "No review server is answering on the configured port or the ports after it; \
                     review links will not open until `openfleet serve` runs"
                );
                url
            }
        };

        let registry = registry(config, url);
        println!("{}", registry.call(&self.name, args).await);
        Ok(())
    }
}

/// Print the definitions of the review tools
pub fn list_tools(config: &Config) -> anyhow::Result<()> {
    let registry = registry(config, ServerConfig::base_url(config.server.port));
    println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
    Ok(())
}

fn registry(config: &Config, url: String) -> ToolRegistry {
    let store = ReviewStore::new(config.storage.reviews_dir());
    ToolRegistry::document_review(Arc::new(ReviewService::new(store, url)))
}

/// Find a running review server on `port` or the ports a busy `port` falls back to
async fn locate_server(port: u16, attempts: u16) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
        .ok()?;

    for offset in 0..attempts.max(1) {
        let candidate = port.checked_add(offset)?;
        let url = ServerConfig::base_url(candidate);
        if is_review_server(&client, &url, candidate).await {
            if offset > 0 {
                tracing::debug!(port, bound = candidate, "Review server is on a fallback port");
            }
            return Some(url);
        }
    }
    None
}

async fn is_review_server(client: &reqwest::Client, url: &str, port: u16) -> bool {
    let response = match client.get(format!("{}/api/health", url)).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(_) => return false,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Health check failed");
            return false;
        }
    };

    match response.json::<Value>().await {
        Ok(health) => health["status"] == "ok" && health["port"] == port,
        Err(_) => false,
    }
}
