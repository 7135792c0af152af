//! Data models for review records
//!
//! Field names are camelCase on disk and on the wire so files written by the
//! review server can be read by the browser client unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix for review identifiers
pub const REVIEW_ID_PREFIX: &str = "rev";
/// Prefix for comment thread identifiers
pub const THREAD_ID_PREFIX: &str = "cmt";
/// Prefix for reply identifiers
pub const REPLY_ID_PREFIX: &str = "rep";

const ID_SUFFIX_LEN: usize = 10;

/// Generate a prefixed identifier such as `rev_3f9a0c1b2d`
pub fn generate_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &random[..ID_SUFFIX_LEN])
}

/// Lifecycle status of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Waiting for the human reviewer
    PendingReview,
    /// Reviewer asked for changes; the agent must resubmit
    ChangesRequested,
    /// Reviewer signed off
    Approved,
}

impl ReviewStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::PendingReview => "pending_review",
            ReviewStatus::ChangesRequested => "changes_requested",
            ReviewStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who wrote a comment or resolved a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Human,
    Agent,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::Human => write!(f, "human"),
            Author::Agent => write!(f, "agent"),
        }
    }
}

/// Decision submitted by the reviewer at the end of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    RequestChanges,
}

impl ReviewDecision {
    /// Parse a decision from its wire name
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approve" => Some(ReviewDecision::Approve),
            "request_changes" => Some(ReviewDecision::RequestChanges),
            _ => None,
        }
    }

    /// Status a pending review moves to when this decision is submitted
    pub fn target_status(&self) -> ReviewStatus {
        match self {
            ReviewDecision::Approve => ReviewStatus::Approved,
            ReviewDecision::RequestChanges => ReviewStatus::ChangesRequested,
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewDecision::Approve => write!(f, "approve"),
            ReviewDecision::RequestChanges => write!(f, "request_changes"),
        }
    }
}

/// A unit of human sign-off on one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique identifier (`rev_` prefix)
    pub id: String,

    /// Absolute path of the document under review
    pub document_path: String,

    /// Content hash captured when the review was created
    pub document_hash: String,

    pub status: ReviewStatus,

    /// Review round, starting at 1
    pub current_round: u32,

    /// Optional context from the agent for the current round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Decision submitted in the current round, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_decision: Option<ReviewDecision>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Create a new review in `pending_review`, round 1
    pub fn new(
        document_path: impl Into<String>,
        document_hash: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(REVIEW_ID_PREFIX),
            document_path: document_path.into(),
            document_hash: document_hash.into(),
            status: ReviewStatus::PendingReview,
            current_round: 1,
            message,
            last_decision: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Browser URL of this review for a server at `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/review/{}", base_url.trim_end_matches('/'), self.id)
    }
}

/// A reply inside a comment thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    /// Unique identifier (`rep_` prefix)
    pub id: String,
    pub thread_id: String,
    pub body: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
}

impl CommentReply {
    /// Create a new reply for the given thread
    pub fn new(thread_id: impl Into<String>, body: impl Into<String>, author: Author) -> Self {
        Self {
            id: generate_id(REPLY_ID_PREFIX),
            thread_id: thread_id.into(),
            body: body.into(),
            author,
            created_at: Utc::now(),
        }
    }
}

/// A comment anchored to a line range of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    /// Unique identifier (`cmt_` prefix)
    pub id: String,
    pub review_id: String,

    /// Round in which the thread was opened
    pub round: u32,

    /// First line of the range (1-based, inclusive)
    pub line_start: u32,
    /// Last line of the range (1-based, inclusive)
    pub line_end: u32,

    pub body: String,
    pub author: Author,
    pub resolved: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<Author>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Replies in the order they were added
    #[serde(default)]
    pub replies: Vec<CommentReply>,
}

impl CommentThread {
    /// Create a new unresolved thread
    pub fn new(
        review_id: impl Into<String>,
        round: u32,
        line_start: u32,
        line_end: u32,
        body: impl Into<String>,
        author: Author,
    ) -> Self {
        Self {
            id: generate_id(THREAD_ID_PREFIX),
            review_id: review_id.into(),
            round,
            line_start,
            line_end,
            body: body.into(),
            author,
            resolved: false,
            resolved_by: None,
            created_at: Utc::now(),
            resolved_at: None,
            replies: Vec::new(),
        }
    }
}

/// On-disk layout of a review's thread file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadsFile {
    pub review_id: String,
    pub threads: Vec<CommentThread>,
}
