//! Document review tools

use async_trait::async_trait;
use fleet_store::Author;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::Tool;
use crate::review::{RequestAction, ReviewService};
use crate::{Error, Result};

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::Other(format!("Invalid arguments for {}: {}", tool, e)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestReviewArgs {
    document_path: String,
    #[serde(default)]
    message: Option<String>,
}

/// Open (or reuse) a review of a markdown document
#[derive(Debug, Clone)]
pub struct RequestReviewTool {
    service: Arc<ReviewService>,
}

impl RequestReviewTool {
    pub fn new(service: Arc<ReviewService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for RequestReviewTool {
    fn name(&self) -> &'static str {
        "request_review"
    }

    fn description(&self) -> &'static str {
        "Request human review of a markdown document.\n\n\
         Opens a browser UI where the reviewer can read the document with line numbers, \
         add inline comments on specific lines and submit \"Approve\" or \"Request Changes\".\n\n\
         Returns immediately with a URL and review ID. Use get_review_status to poll for completion.\n\n\
         Example:\n  request_review({ documentPath: \"/home/me/.openfleet/tasks/feature/HLD.md\" })"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "documentPath": {
                    "type": "string",
                    "description": "Absolute path to the markdown file to review"
                },
                "message": {
                    "type": "string",
                    "description": "Message explaining what to focus on"
                }
            },
            "required": ["documentPath"]
        })
    }

    async fn run(&self, args: Value) -> Result<Value> {
        let args: RequestReviewArgs = parse_args(self.name(), args)?;
        let outcome = self
            .service
            .request_review(&args.document_path, args.message)
            .await?;

        let message = match outcome.action {
            RequestAction::Reuse => {
                "Existing review already pending. Please wait for reviewer feedback.".to_string()
            }
            RequestAction::Resubmit => format!(
                "Review resubmitted for round {}. Reviewer notified.",
                outcome.review.current_round
            ),
            RequestAction::Create => {
                "Review opened. Use get_review_status to check progress.".to_string()
            }
        };

        Ok(json!({
            "reviewId": outcome.review.id,
            "url": outcome.url,
            "status": outcome.review.status,
            "message": message,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewIdArgs {
    review_id: String,
}

/// Report review status and comment threads
#[derive(Debug, Clone)]
pub struct GetReviewStatusTool {
    service: Arc<ReviewService>,
}

impl GetReviewStatusTool {
    pub fn new(service: Arc<ReviewService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetReviewStatusTool {
    fn name(&self) -> &'static str {
        "get_review_status"
    }

    fn description(&self) -> &'static str {
        "Check the status of a document review.\n\n\
         Use this to poll for review completion after calling request_review. \
         Returns the current status, the comment threads and pending/resolved counts.\n\n\
         Example:\n  get_review_status({ reviewId: \"rev_abc123\" })"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reviewId": {
                    "type": "string",
                    "description": "The review ID returned from request_review"
                }
            },
            "required": ["reviewId"]
        })
    }

    async fn run(&self, args: Value) -> Result<Value> {
        let args: ReviewIdArgs = parse_args(self.name(), args)?;
        let report = self.service.status_report(&args.review_id).await?;
        Ok(serde_json::to_value(report)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadArgs {
    review_id: String,
    thread_id: String,
}

/// Mark a thread resolved on behalf of the agent
#[derive(Debug, Clone)]
pub struct ResolveCommentTool {
    service: Arc<ReviewService>,
}

impl ResolveCommentTool {
    pub fn new(service: Arc<ReviewService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ResolveCommentTool {
    fn name(&self) -> &'static str {
        "resolve_comment"
    }

    fn description(&self) -> &'static str {
        "Mark a comment thread as resolved after addressing the feedback.\n\n\
         Call this after you've updated the document to address a reviewer's comment.\n\n\
         Example:\n  resolve_comment({ reviewId: \"rev_abc\", threadId: \"cmt_xyz\" })"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reviewId": { "type": "string", "description": "The review ID" },
                "threadId": { "type": "string", "description": "The thread ID to resolve" }
            },
            "required": ["reviewId", "threadId"]
        })
    }

    async fn run(&self, args: Value) -> Result<Value> {
        let args: ThreadArgs = parse_args(self.name(), args)?;
        let resolution = self
            .service
            .set_resolved(&args.review_id, &args.thread_id, Some(true), Author::Agent)
            .await?;

        Ok(json!({
            "threadId": resolution.thread_id,
            "resolved": resolution.resolved,
            "resolvedBy": resolution.resolved_by,
            "resolvedAt": resolution.resolved_at,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddReplyArgs {
    review_id: String,
    thread_id: String,
    body: String,
}

/// Reply to a thread on behalf of the agent
#[derive(Debug, Clone)]
pub struct AddReplyTool {
    service: Arc<ReviewService>,
}

impl AddReplyTool {
    pub fn new(service: Arc<ReviewService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for AddReplyTool {
    fn name(&self) -> &'static str {
        "add_reply"
    }

    fn description(&self) -> &'static str {
        "Add a reply to a comment thread.\n\n\
         Use this to respond to reviewer feedback, ask clarifying questions, \
         or explain how you addressed a comment.\n\n\
         Example:\n  add_reply({ reviewId: \"rev_abc\", threadId: \"cmt_xyz\", body: \"Good point, I've added error handling\" })"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reviewId": { "type": "string", "description": "The review ID" },
                "threadId": { "type": "string", "description": "The thread ID to reply to" },
                "body": { "type": "string", "description": "The reply content (markdown supported)" }
            },
            "required": ["reviewId", "threadId", "body"]
        })
    }

    async fn run(&self, args: Value) -> Result<Value> {
        let args: AddReplyArgs = parse_args(self.name(), args)?;
        let reply = self
            .service
            .add_reply(&args.review_id, &args.thread_id, &args.body, Author::Agent)
            .await?;

        Ok(json!({
            "replyId": reply.id,
            "threadId": reply.thread_id,
            "body": reply.body,
            "author": reply.author,
            "createdAt": reply.created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::ToolRegistry;
    use super::*;
    use fleet_store::{ReviewDecision, ReviewStore};
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        service: Arc<ReviewService>,
        registry: ToolRegistry,
        doc: PathBuf,
    }

    fn setup() -> Fixture {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("HLD.md");
        std::fs::write(&doc, "# Design\n\nUse a queue.\n").unwrap();

        let store = ReviewStore::new(temp.path().join("reviews"));
        let service = Arc::new(ReviewService::new(store, "http://localhost:4242"));
        let registry = ToolRegistry::document_review(Arc::clone(&service));
        Fixture {
            _temp: temp,
            service,
            registry,
            doc,
        }
    }

    async fn call(f: &Fixture, name: &str, args: Value) -> Value {
        serde_json::from_str(&f.registry.call(name, args).await).unwrap()
    }

    #[tokio::test]
    async fn test_request_review_twice_returns_same_id() {
        let f = setup();
        let args = json!({ "documentPath": f.doc.to_str().unwrap() });

        let first = call(&f, "request_review", args.clone()).await;
        let second = call(&f, "request_review", args).await;

        assert_eq!(first["status"], "pending_review");
        assert_eq!(first["reviewId"], second["reviewId"]);
        assert_eq!(
            second["message"],
            "Existing review already pending. Please wait for reviewer feedback."
        );
        let url = first["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:4242/review/rev_"));
    }

    #[tokio::test]
    async fn test_request_review_resubmit_message() {
        let f = setup();
        let args = json!({ "documentPath": f.doc.to_str().unwrap() });
        let first = call(&f, "request_review", args.clone()).await;
        let review_id = first["reviewId"].as_str().unwrap();
        f.service
            .submit(review_id, ReviewDecision::RequestChanges)
            .await
            .unwrap();

        let second = call(&f, "request_review", args).await;
        assert_eq!(second["reviewId"], first["reviewId"]);
        assert_eq!(
            second["message"],
            "Review resubmitted for round 2. Reviewer notified."
        );
    }

    #[tokio::test]
    async fn test_request_review_rejects_relative_path() {
        let f = setup();
        let result = call(&f, "request_review", json!({ "documentPath": "docs/HLD.md" })).await;
        assert_eq!(result["error"], "documentPath must be an absolute path");
    }

    #[tokio::test]
    async fn test_missing_arguments_are_reported() {
        let f = setup();
        let result = call(&f, "get_review_status", json!({})).await;
        let error = result["error"].as_str().unwrap();
        assert!(error.starts_with("Invalid arguments for get_review_status"));
    }

    #[tokio::test]
    async fn test_resolve_and_reply_round_trip() {
        let f = setup();
        let review = f
            .service
            .request_review(f.doc.to_str().unwrap(), None)
            .await
            .unwrap()
            .review;
        let thread = f
            .service
            .create_thread(&review.id, 3, 3, "Which queue?", Author::Human)
            .await
            .unwrap();
        let ids = json!({ "reviewId": review.id, "threadId": thread.id });

        let reply = call(
            &f,
            "add_reply",
            json!({ "reviewId": review.id, "threadId": thread.id, "body": "SQS, added a note" }),
        )
        .await;
        assert_eq!(reply["author"], "agent");
        assert_eq!(reply["threadId"], thread.id.as_str());
        assert!(reply["replyId"].as_str().unwrap().starts_with("rep_"));

        let resolved = call(&f, "resolve_comment", ids).await;
        assert_eq!(resolved["resolved"], true);
        assert_eq!(resolved["resolvedBy"], "agent");
        assert!(resolved["resolvedAt"].is_string());

        let status = call(&f, "get_review_status", json!({ "reviewId": review.id })).await;
        assert_eq!(status["pendingCount"], 0);
        assert_eq!(status["resolvedCount"], 1);
        assert_eq!(status["currentRound"], 1);
        assert_eq!(status["threads"][0]["replyCount"], 1);
        assert_eq!(status["threads"][0]["lineStart"], 3);
    }

    #[tokio::test]
    async fn test_status_reports_decision() {
        let f = setup();
        let review = f
            .service
            .request_review(f.doc.to_str().unwrap(), None)
            .await
            .unwrap()
            .review;
        f.service
            .submit(&review.id, ReviewDecision::Approve)
            .await
            .unwrap();

        let status = call(&f, "get_review_status", json!({ "reviewId": review.id })).await;
        assert_eq!(status["status"], "approved");
        assert_eq!(status["decision"], "approve");
    }

    #[tokio::test]
    async fn test_errors_for_unknown_ids() {
        let f = setup();
        let result = call(
            &f,
            "resolve_comment",
            json!({ "reviewId": "rev_missing", "threadId": "cmt_missing" }),
        )
        .await;
        assert_eq!(result["error"], "Review with ID 'rev_missing' not found");

        let review = f
            .service
            .request_review(f.doc.to_str().unwrap(), None)
            .await
            .unwrap()
            .review;
        let result = call(
            &f,
            "add_reply",
            json!({ "reviewId": review.id, "threadId": "cmt_missing", "body": "hi" }),
        )
        .await;
        assert_eq!(result["error"], "Thread with ID 'cmt_missing' not found");

        let result = call(
            &f,
            "add_reply",
            json!({ "reviewId": review.id, "threadId": "cmt_missing", "body": "  " }),
        )
        .await;
        assert_eq!(result["error"], "Reply body is required");
    }
}
