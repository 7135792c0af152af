//! Tool bindings exposed to the orchestrating agent runtime
//!
//! A tool takes JSON arguments and produces a JSON value. The registry turns
//! every outcome into a JSON string; failures become `{"error": "..."}` so the
//! calling agent can decide how to react instead of seeing a fault.

pub mod review;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::review::ReviewService;
use crate::Result;

pub use review::{AddReplyTool, GetReviewStatusTool, RequestReviewTool, ResolveCommentTool};

/// An action callable by an agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the agent calls the tool by
    fn name(&self) -> &'static str;

    /// Usage notes shown to the agent
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    /// Run the tool with already-decoded arguments
    async fn run(&self, args: Value) -> Result<Value>;
}

/// Serializable description of a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// The set of tools offered to the agent runtime
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with the four document review tools
    pub fn document_review(service: Arc<ReviewService>) -> Self {
        Self::new()
            .with_tool(RequestReviewTool::new(Arc::clone(&service)))
            .with_tool(GetReviewStatusTool::new(Arc::clone(&service)))
            .with_tool(ResolveCommentTool::new(Arc::clone(&service)))
            .with_tool(AddReplyTool::new(service))
    }

    /// Add a tool
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    /// Names of the registered tools
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions of the registered tools
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name(),
                description: t.description(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Call a tool by name
    ///
    /// Never fails: unknown tools and tool errors yield `{"error": ...}`.
    pub async fn call_value(&self, name: &str, args: Value) -> Value {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            tracing::warn!(tool = %name, "Unknown tool called");
            return error_value(format!("Unknown tool: {}", name));
        };

        tracing::debug!(tool = %name, "Executing tool");
        match tool.run(args).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "Tool call failed");
                error_value(e.to_string())
            }
        }
    }

    /// Call a tool by name and return its pretty-printed JSON result
    pub async fn call(&self, name: &str, args: Value) -> String {
        render(&self.call_value(name, args).await)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn error_value(message: String) -> Value {
    json!({ "error": message })
}

fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_store::ReviewStore;
    use tempfile::TempDir;

    fn registry(temp: &TempDir) -> ToolRegistry {
        let store = ReviewStore::new(temp.path().join("reviews"));
        ToolRegistry::document_review(Arc::new(ReviewService::new(
            store,
            "http://localhost:4242",
        )))
    }

    #[test]
    fn test_document_review_tools_registered() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        assert_eq!(
            registry.names(),
            vec![
                "request_review",
                "get_review_status",
                "resolve_comment",
                "add_reply"
            ]
        );

        for def in registry.definitions() {
            assert_eq!(def.parameters["type"], "object");
            assert!(!def.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_error_json() {
        let temp = TempDir::new().unwrap();
        let output = registry(&temp).call("delete_everything", json!({})).await;

        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["error"], "Unknown tool: delete_everything");
    }
}
