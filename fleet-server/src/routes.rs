//! HTTP route handlers for the review API.
//!
//! Handlers that take a body read it as raw bytes and decode it themselves, so
//! a missing review or a state conflict is reported before a malformed body.

use crate::error::ApiError;
use crate::ui;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use fleet_core::{ErrorKind, RequestAction, Submission};
use fleet_store::{
    Author, CommentReply, CommentThread, DocumentContent, Review, ReviewDecision, ReviewStatus,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

type ApiResult<T> = std::result::Result<T, ApiError>;

fn parse_body(body: &Bytes) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|_| ApiError::invalid_json())
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Line numbers that are not positive integers map to 0, which fails validation
fn line_field(value: &Value, key: &str) -> u32 {
    value
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub port: u16,
    pub uptime: u64,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        port: state.port,
        uptime: state.uptime_seconds(),
    })
}

/// Review creation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewResponse {
    pub id: String,
    pub document_path: String,
    pub status: ReviewStatus,
    pub current_round: u32,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Open a review, or reuse/resubmit the latest one for the same document.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CreateReviewResponse>)> {
    let body = parse_body(&body)?;
    let document_path = str_field(&body, "documentPath").unwrap_or_default();
    let message = str_field(&body, "message").map(str::to_string);

    let outcome = state.service.request_review(document_path, message).await?;

    let (status, message) = match outcome.action {
        RequestAction::Create => (StatusCode::CREATED, None),
        RequestAction::Reuse => (
            StatusCode::OK,
            Some("Existing review already pending".to_string()),
        ),
        RequestAction::Resubmit => (
            StatusCode::OK,
            Some(format!(
                "Review resubmitted for round {}",
                outcome.review.current_round
            )),
        ),
    };

    let review = outcome.review;
    Ok((
        status,
        Json(CreateReviewResponse {
            id: review.id,
            document_path: review.document_path,
            status: review.status,
            current_round: review.current_round,
            url: outcome.url,
            created_at: review.created_at,
            message,
        }),
    ))
}

/// Get a review record.
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> ApiResult<Json<Review>> {
    Ok(Json(state.service.get_review(&review_id).await?))
}

/// Get the current content of the reviewed document.
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> ApiResult<Json<DocumentContent>> {
    Ok(Json(state.service.get_document(&review_id).await?))
}

/// Thread list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadsResponse {
    pub review_id: String,
    pub threads: Vec<CommentThread>,
}

/// List the comment threads of a review.
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> ApiResult<Json<ThreadsResponse>> {
    let threads = state.service.list_threads(&review_id).await?;
    Ok(Json(ThreadsResponse { review_id, threads }))
}

/// Open a comment thread on a line range.
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CommentThread>)> {
    state.service.get_review(&review_id).await?;
    let body = parse_body(&body)?;

    let thread = state
        .service
        .create_thread(
            &review_id,
            line_field(&body, "lineStart"),
            line_field(&body, "lineEnd"),
            str_field(&body, "body").unwrap_or_default(),
            Author::Human,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(thread)))
}

/// Thread resolution response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResponse {
    pub id: String,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Resolve or reopen a thread; a body without a boolean `resolved` changes nothing.
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Path((review_id, thread_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<ResolutionResponse>> {
    state.service.ensure_thread(&review_id, &thread_id).await?;
    let body = parse_body(&body)?;
    let resolved = body.get("resolved").and_then(Value::as_bool);

    let resolution = state
        .service
        .set_resolved(&review_id, &thread_id, resolved, Author::Human)
        .await?;

    Ok(Json(ResolutionResponse {
        id: resolution.thread_id,
        resolved: resolution.resolved,
        resolved_by: resolution.resolved_by,
        resolved_at: resolution.resolved_at,
    }))
}

/// Reply to a thread as the human reviewer.
pub async fn add_reply(
    State(state): State<Arc<AppState>>,
    Path((review_id, thread_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CommentReply>)> {
    state.service.ensure_thread(&review_id, &thread_id).await?;
    let body = parse_body(&body)?;

    let reply = state
        .service
        .add_reply(
            &review_id,
            &thread_id,
            str_field(&body, "body").unwrap_or_default(),
            Author::Human,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

/// Record the reviewer's decision.
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Submission>> {
    state
        .service
        .ensure_status(&review_id, ReviewStatus::PendingReview, "submit")
        .await?;
    let body = parse_body(&body)?;

    let raw = str_field(&body, "decision").unwrap_or_default();
    let decision = ReviewDecision::parse(raw)
        .ok_or_else(|| fleet_core::Error::InvalidDecision(raw.to_string()))?;

    let submission = state.service.submit(&review_id, decision).await?;
    Ok(Json(submission))
}

/// Resubmission response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResubmitResponse {
    pub id: String,
    pub status: ReviewStatus,
    pub current_round: u32,
    pub url: String,
}

/// Start the next round after changes were requested.
pub async fn resubmit_review(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ResubmitResponse>> {
    let message = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|body| str_field(&body, "message").map(str::to_string));

    let review = state.service.resubmit(&review_id, message).await?;
    let url = state.service.review_url(&review);

    Ok(Json(ResubmitResponse {
        id: review.id,
        status: review.status,
        current_round: review.current_round,
        url,
    }))
}

/// Browser page for a review.
pub async fn review_page(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> Response {
    match state.service.get_review(&review_id).await {
        Ok(_) => Html(ui::render_review_page(&review_id, state.poll_interval)).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(review_id = %review_id, "Review page requested for unknown review");
            (
                StatusCode::NOT_FOUND,
                Html(ui::render_not_found_page(&review_id)),
            )
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Fallback for unknown API paths.
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found")
}
