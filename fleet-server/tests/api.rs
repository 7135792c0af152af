//! Integration tests for the review API.
//!
//! Each test starts a real server on an ephemeral port over a scratch data
//! directory and drives it with reqwest.

use fleet_core::Config;
use fleet_server::{ReviewServer, RunningServer};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

struct TestServer {
    _temp: TempDir,
    server: RunningServer,
    base: String,
    doc: PathBuf,
}

async fn start_test_server() -> TestServer {
    let temp = TempDir::new().unwrap();
    let doc = temp.path().join("HLD.md");
    std::fs::write(&doc, "# High level design\n\nUse a queue.\nRetry on failure.\n").unwrap();

    let mut config = Config::default();
    config.server.port = 0;
    config.server.max_port_attempts = 1;
    config.storage.data_dir = temp.path().join("data");

    let server = ReviewServer::new(config).start().await.unwrap();
    let base = format!("http://127.0.0.1:{}", server.port());

    TestServer {
        _temp: temp,
        server,
        base,
        doc,
    }
}

/// Helper to GET a URL and return (status, body_string).
async fn get(base: &str, path: &str) -> (u16, String) {
    let resp = reqwest::get(format!("{}{}", base, path)).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

/// Helper to send a raw body and return (status, parsed JSON).
async fn send(method: reqwest::Method, base: &str, path: &str, body: &str) -> (u16, Value) {
    let client = reqwest::Client::new();
    let resp = client
        .request(method, format!("{}{}", base, path))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap();
    (status, serde_json::from_str(&body).unwrap())
}

async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
    send(reqwest::Method::POST, base, path, &body.to_string()).await
}

async fn get_json(base: &str, path: &str) -> (u16, Value) {
    let (status, body) = get(base, path).await;
    (status, serde_json::from_str(&body).unwrap())
}

async fn create_review(t: &TestServer) -> String {
    let (status, body) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": t.doc.to_str().unwrap() }),
    )
    .await;
    assert_eq!(status, 201);
    body["id"].as_str().unwrap().to_string()
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let t = start_test_server().await;
    let (status, body) = get_json(&t.base, "/api/health").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["port"], t.server.port());
    assert!(body["uptime"].is_u64());
}

// ============================================================================
// Review lifecycle
// ============================================================================

#[tokio::test]
async fn test_full_review_cycle() {
    let t = start_test_server().await;
    let path = t.doc.to_str().unwrap();

    let (status, created) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": path, "message": "check the retry story" }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["status"], "pending_review");
    assert_eq!(created["currentRound"], 1);
    assert_eq!(created["documentPath"], path);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(
        created["url"],
        format!("http://localhost:{}/review/{}", t.server.port(), id)
    );

    let (status, submitted) = post(
        &t.base,
        &format!("/api/reviews/{}/submit", id),
        json!({ "decision": "request_changes" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(submitted["status"], "changes_requested");
    assert_eq!(submitted["decision"], "request_changes");
    assert!(submitted["submittedAt"].is_string());

    let (status, resubmitted) = post(
        &t.base,
        &format!("/api/reviews/{}/resubmit", id),
        json!({ "message": "addressed" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(resubmitted["status"], "pending_review");
    assert_eq!(resubmitted["currentRound"], 2);

    let (status, approved) = post(
        &t.base,
        &format!("/api/reviews/{}/submit", id),
        json!({ "decision": "approve" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["currentRound"], 2);

    let (status, review) = get_json(&t.base, &format!("/api/reviews/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(review["status"], "approved");
    assert_eq!(review["message"], "addressed");

    t.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_request_review_reuses_pending_review() {
    let t = start_test_server().await;
    let id = create_review(&t).await;

    let (status, body) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": t.doc.to_str().unwrap() }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["message"], "Existing review already pending");
}

#[tokio::test]
async fn test_request_review_resubmits_changes_requested() {
    let t = start_test_server().await;
    let id = create_review(&t).await;
    post(
        &t.base,
        &format!("/api/reviews/{}/submit", id),
        json!({ "decision": "request_changes" }),
    )
    .await;

    let (status, body) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": t.doc.to_str().unwrap() }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["currentRound"], 2);
    assert_eq!(body["status"], "pending_review");
}

#[tokio::test]
async fn test_create_review_validation() {
    let t = start_test_server().await;

    let (status, body) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": "relative/path.md" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_PATH");

    let (status, body) = post(&t.base, "/api/reviews", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["message"], "documentPath is required");

    let missing = t.doc.with_file_name("missing.md");
    let (status, body) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": missing.to_str().unwrap() }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "FILE_NOT_FOUND");

    let (status, body) = send(reqwest::Method::POST, &t.base, "/api/reviews", "{not json").await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_JSON");
}

#[tokio::test]
async fn test_submit_checks_state_before_body() {
    let t = start_test_server().await;
    let id = create_review(&t).await;
    let submit = format!("/api/reviews/{}/submit", id);

    let (status, body) = post(&t.base, &submit, json!({ "decision": "maybe" })).await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_DECISION");

    let (status, body) = send(reqwest::Method::POST, &t.base, &submit, "nope").await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_JSON");

    post(&t.base, &submit, json!({ "decision": "approve" })).await;

    let (status, body) = send(reqwest::Method::POST, &t.base, &submit, "nope").await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_STATE");
    assert_eq!(
        body["error"]["message"],
        "Review must be in 'pending_review' state to submit, current state: 'approved'"
    );
}

#[tokio::test]
async fn test_resubmit_requires_changes_requested() {
    let t = start_test_server().await;
    let id = create_review(&t).await;

    let (status, body) = post(
        &t.base,
        &format!("/api/reviews/{}/resubmit", id),
        json!({}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_STATE");

    let (_, review) = get_json(&t.base, &format!("/api/reviews/{}", id)).await;
    assert_eq!(review["currentRound"], 1);
}

#[tokio::test]
async fn test_resubmit_accepts_unparsable_body() {
    let t = start_test_server().await;
    let id = create_review(&t).await;
    post(
        &t.base,
        &format!("/api/reviews/{}/submit", id),
        json!({ "decision": "request_changes" }),
    )
    .await;

    let (status, body) = send(
        reqwest::Method::POST,
        &t.base,
        &format!("/api/reviews/{}/resubmit", id),
        "",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["currentRound"], 2);
}

#[tokio::test]
async fn test_unknown_review() {
    let t = start_test_server().await;

    let (status, body) = get_json(&t.base, "/api/reviews/rev_missing").await;
    assert_eq!(status, 404);
    assert_eq!(error_code(&body), "REVIEW_NOT_FOUND");
    assert_eq!(body["error"]["message"], "Review with ID 'rev_missing' not found");

    let (status, body) = get_json(&t.base, "/api/reviews/rev_missing/threads").await;
    assert_eq!(status, 404);
    assert_eq!(error_code(&body), "REVIEW_NOT_FOUND");
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn test_document_content() {
    let t = start_test_server().await;
    let id = create_review(&t).await;

    let (status, doc) = get_json(&t.base, &format!("/api/reviews/{}/document", id)).await;
    assert_eq!(status, 200);
    assert_eq!(doc["lines"][0], "# High level design");
    assert!(doc["hash"].as_str().unwrap().starts_with("sha256:"));

    std::fs::remove_file(&t.doc).unwrap();
    let (status, body) = get_json(&t.base, &format!("/api/reviews/{}/document", id)).await;
    assert_eq!(status, 404);
    assert_eq!(error_code(&body), "DOCUMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_directory_is_not_a_document() {
    let t = start_test_server().await;
    let dir = t.doc.with_file_name("adir");
    std::fs::create_dir(&dir).unwrap();

    let (status, body) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": dir.to_str().unwrap() }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "FILE_NOT_FOUND");

    // The document is swapped for a directory after the review exists
    let id = create_review(&t).await;
    std::fs::remove_file(&t.doc).unwrap();
    std::fs::create_dir(&t.doc).unwrap();
    let (status, body) = get_json(&t.base, &format!("/api/reviews/{}/document", id)).await;
    assert_eq!(status, 404);
    assert_eq!(error_code(&body), "DOCUMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_latin1_document_is_reviewable() {
    let t = start_test_server().await;
    let latin1 = t.doc.with_file_name("notes.md");
    std::fs::write(&latin1, b"# Caf\xe9 notes\n").unwrap();

    let (status, body) = post(
        &t.base,
        "/api/reviews",
        json!({ "documentPath": latin1.to_str().unwrap() }),
    )
    .await;
    assert_eq!(status, 201);

    let id = body["id"].as_str().unwrap();
    let (status, doc) = get_json(&t.base, &format!("/api/reviews/{}/document", id)).await;
    assert_eq!(status, 200);
    assert_eq!(doc["lines"][0], "# Caf\u{FFFD} notes");
}

// ============================================================================
// Threads and replies
// ============================================================================

#[tokio::test]
async fn test_thread_lifecycle() {
    let t = start_test_server().await;
    let id = create_review(&t).await;
    let threads = format!("/api/reviews/{}/threads", id);

    let (status, body) = post(
        &t.base,
        &threads,
        json!({ "lineStart": 5, "lineEnd": 3, "body": "backwards" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_LINES");

    let (status, body) = post(
        &t.base,
        &threads,
        json!({ "lineStart": "3", "lineEnd": 5, "body": "string lines" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_LINES");

    let (status, body) = post(
        &t.base,
        &threads,
        json!({ "lineStart": 0, "lineEnd": 0, "body": "  " }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "BODY_REQUIRED");

    let (status, thread) = post(
        &t.base,
        &threads,
        json!({ "lineStart": 3, "lineEnd": 4, "body": "Which queue?" }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(thread["round"], 1);
    assert_eq!(thread["author"], "human");
    assert_eq!(thread["resolved"], false);
    let thread_id = thread["id"].as_str().unwrap().to_string();

    let (status, listed) = get_json(&t.base, &threads).await;
    assert_eq!(status, 200);
    assert_eq!(listed["reviewId"], id.as_str());
    assert_eq!(listed["threads"].as_array().unwrap().len(), 1);
    assert_eq!(listed["threads"][0]["id"], thread_id.as_str());

    let thread_path = format!("{}/{}", threads, thread_id);
    let (status, resolved) = send(
        reqwest::Method::PATCH,
        &t.base,
        &thread_path,
        r#"{"resolved": true}"#,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(resolved["resolved"], true);
    assert_eq!(resolved["resolvedBy"], "human");
    assert!(resolved["resolvedAt"].is_string());

    let (status, unchanged) = send(
        reqwest::Method::PATCH,
        &t.base,
        &thread_path,
        r#"{"resolved": "yes"}"#,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(unchanged["resolved"], true);

    let (status, reopened) = send(
        reqwest::Method::PATCH,
        &t.base,
        &thread_path,
        r#"{"resolved": false}"#,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(reopened["resolved"], false);
    assert!(reopened.get("resolvedBy").is_none());
    assert!(reopened.get("resolvedAt").is_none());

    let (status, reply) = post(
        &t.base,
        &format!("{}/replies", thread_path),
        json!({ "body": "The durable one" }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(reply["threadId"], thread_id.as_str());
    assert_eq!(reply["author"], "human");

    let (status, body) = post(
        &t.base,
        &format!("{}/replies", thread_path),
        json!({ "body": "" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "BODY_REQUIRED");

    let (_, listed) = get_json(&t.base, &threads).await;
    assert_eq!(listed["threads"][0]["replies"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_thread_checked_before_body() {
    let t = start_test_server().await;
    let id = create_review(&t).await;
    let path = format!("/api/reviews/{}/threads/cmt_missing", id);

    let (status, body) = send(reqwest::Method::PATCH, &t.base, &path, "garbage").await;
    assert_eq!(status, 404);
    assert_eq!(error_code(&body), "THREAD_NOT_FOUND");

    let (status, body) = send(
        reqwest::Method::POST,
        &t.base,
        &format!("{}/replies", path),
        "garbage",
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(error_code(&body), "THREAD_NOT_FOUND");
}

// ============================================================================
// Browser page
// ============================================================================

#[tokio::test]
async fn test_review_page() {
    let t = start_test_server().await;
    let id = create_review(&t).await;

    let (status, html) = get(&t.base, &format!("/review/{}", id)).await;
    assert_eq!(status, 200);
    assert!(html.contains(&format!(r#"const REVIEW_ID = "{}";"#, id)));
    assert!(html.contains("const POLL_INTERVAL_MS = 5000;"));

    let (status, html) = get(&t.base, "/review/rev_missing").await;
    assert_eq!(status, 404);
    assert!(html.contains("Review Not Found"));
}
