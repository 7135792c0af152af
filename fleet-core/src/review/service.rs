//! Review operations over the file store
//!
//! `ReviewService` is the one place where lifecycle rules meet storage. The
//! HTTP handlers and the agent tool bindings both go through it.
//!
//! Every read-modify-write of a review or its thread file runs while holding
//! that review's lock, and review requests hold a lock on the document path,
//! so concurrent calls inside one process cannot lose updates or open two
//! reviews for the same document.

use chrono::{DateTime, Utc};
use fleet_store::{
    read_document, Author, CommentReply, CommentThread, DocumentContent, Review, ReviewDecision,
    ReviewStatus, ReviewStore,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::state::{self, RequestAction};
use super::threads::{self, Resolution};
use crate::error::{Error, Result};

/// Lazily created async mutexes keyed by string
///
/// An entry lives only while someone holds or waits on it.
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key.to_string()).or_default().clone()
        };
        KeyedGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct KeyedGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Waiters clone the Arc under the map lock, so a count of one means nobody else
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// Result of a review request
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub review: Review,
    pub action: RequestAction,
    pub url: String,
}

impl RequestOutcome {
    /// Whether a new review record was created
    pub fn created(&self) -> bool {
        self.action == RequestAction::Create
    }
}

/// Result of a reviewer decision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub status: ReviewStatus,
    pub current_round: u32,
    pub decision: ReviewDecision,
    pub submitted_at: DateTime<Utc>,
}

/// Compact view of a thread for agents
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub id: String,
    pub line_start: u32,
    pub line_end: u32,
    pub body: String,
    pub author: Author,
    pub resolved: bool,
    pub reply_count: usize,
}

impl From<&CommentThread> for ThreadSummary {
    fn from(thread: &CommentThread) -> Self {
        Self {
            id: thread.id.clone(),
            line_start: thread.line_start,
            line_end: thread.line_end,
            body: thread.body.clone(),
            author: thread.author,
            resolved: thread.resolved,
            reply_count: thread.replies.len(),
        }
    }
}

/// Status of a review with its threads summarized
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatusReport {
    pub review_id: String,
    pub status: ReviewStatus,
    pub current_round: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<ReviewDecision>,
    pub threads: Vec<ThreadSummary>,
    pub pending_count: usize,
    pub resolved_count: usize,
}

/// Review operations shared by the HTTP API and the tool bindings
#[derive(Debug)]
pub struct ReviewService {
    store: ReviewStore,
    base_url: String,
    review_locks: KeyedLocks,
    path_locks: KeyedLocks,
}

impl ReviewService {
    /// Create a service over `store` whose review URLs point at `base_url`
    pub fn new(store: ReviewStore, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into(),
            review_locks: KeyedLocks::default(),
            path_locks: KeyedLocks::default(),
        }
    }

    /// Browser URL of a review
    pub fn review_url(&self, review: &Review) -> String {
        review.url(&self.base_url)
    }

    fn load_review(&self, review_id: &str) -> Result<Review> {
        match self.store.get(review_id) {
            Ok(Some(review)) => Ok(review),
            Ok(None) => Err(Error::ReviewNotFound(review_id.to_string())),
            Err(e) => {
                tracing::error!(review_id = %review_id, error = %e, "Failed to load review");
                Err(e.into())
            }
        }
    }

    fn load_threads(&self, review_id: &str) -> Result<Vec<CommentThread>> {
        self.store.get_threads(review_id).map_err(|e| {
            tracing::error!(review_id = %review_id, error = %e, "Failed to load threads");
            e.into()
        })
    }

    /// Request review of a document
    ///
    /// A pending review for the same path is returned unchanged, a review with
    /// changes requested moves to its next round, and otherwise a new review
    /// is opened.
    pub async fn request_review(
        &self,
        document_path: &str,
        message: Option<String>,
    ) -> Result<RequestOutcome> {
        if document_path.is_empty() {
            return Err(Error::InvalidPath("documentPath is required".to_string()));
        }
        if !Path::new(document_path).is_absolute() {
            return Err(Error::InvalidPath(
                "documentPath must be an absolute path".to_string(),
            ));
        }
        if !Path::new(document_path).is_file() {
            return Err(Error::FileNotFound(document_path.into()));
        }

        let _path_guard = self.path_locks.lock(document_path).await;

        if let Some(existing) = self.store.find_by_path(document_path)? {
            let _review_guard = self.review_locks.lock(&existing.id).await;
            let mut review = self.load_review(&existing.id)?;

            match state::plan_request(Some(&review)) {
                RequestAction::Reuse => {
                    tracing::debug!(review_id = %review.id, "Review already pending");
                    return Ok(self.outcome(review, RequestAction::Reuse));
                }
                RequestAction::Resubmit => {
                    state::resubmit(&mut review, message)?;
                    self.store.save(&review)?;
                    tracing::info!(
                        review_id = %review.id,
                        round = review.current_round,
                        "Review resubmitted"
                    );
                    return Ok(self.outcome(review, RequestAction::Resubmit));
                }
                RequestAction::Create => {}
            }
        }

        let document = read_document(document_path)?
            .ok_or_else(|| Error::FileNotFound(document_path.into()))?;

        let review = Review::new(document_path, document.hash, message);
        self.store.save(&review)?;
        tracing::info!(review_id = %review.id, document_path = %document_path, "Review created");

        Ok(self.outcome(review, RequestAction::Create))
    }

    fn outcome(&self, review: Review, action: RequestAction) -> RequestOutcome {
        let url = self.review_url(&review);
        RequestOutcome {
            review,
            action,
            url,
        }
    }

    /// Get a review by ID
    pub async fn get_review(&self, review_id: &str) -> Result<Review> {
        self.load_review(review_id)
    }

    /// List all reviews, newest first
    pub async fn list_reviews(&self) -> Result<Vec<Review>> {
        Ok(self.store.list()?)
    }

    /// Read the document of a review as it is on disk now
    pub async fn get_document(&self, review_id: &str) -> Result<DocumentContent> {
        let review = self.load_review(review_id)?;
        read_document(&review.document_path)?
            .ok_or_else(|| Error::DocumentNotFound(review.document_path.into()))
    }

    /// List the threads of a review
    pub async fn list_threads(&self, review_id: &str) -> Result<Vec<CommentThread>> {
        self.load_review(review_id)?;
        self.load_threads(review_id)
    }

    /// Fail unless the review exists and contains the thread
    pub async fn ensure_thread(&self, review_id: &str, thread_id: &str) -> Result<()> {
        let mut threads = self.list_threads(review_id).await?;
        threads::find_thread_mut(&mut threads, thread_id).map(|_| ())
    }

    /// Fail unless the review exists and is in `required` state
    pub async fn ensure_status(
        &self,
        review_id: &str,
        required: ReviewStatus,
        action: &'static str,
    ) -> Result<Review> {
        let review = self.load_review(review_id)?;
        if review.status != required {
            return Err(Error::InvalidState {
                action,
                required,
                actual: review.status,
            });
        }
        Ok(review)
    }

    /// Open a thread on a line range of the review's document
    pub async fn create_thread(
        &self,
        review_id: &str,
        line_start: u32,
        line_end: u32,
        body: &str,
        author: Author,
    ) -> Result<CommentThread> {
        let _guard = self.review_locks.lock(review_id).await;
        let review = self.load_review(review_id)?;

        let thread = threads::create_thread(&review, line_start, line_end, body, author)?;

        let mut threads = self.load_threads(review_id)?;
        threads.push(thread.clone());
        self.store.save_threads(review_id, &threads)?;

        tracing::info!(
            review_id = %review_id,
            thread_id = %thread.id,
            line_start,
            line_end,
            "Thread created"
        );
        Ok(thread)
    }

    /// Resolve or reopen a thread; `None` leaves it as is
    pub async fn set_resolved(
        &self,
        review_id: &str,
        thread_id: &str,
        resolved: Option<bool>,
        by: Author,
    ) -> Result<Resolution> {
        let _guard = self.review_locks.lock(review_id).await;
        self.load_review(review_id)?;
        let mut threads = self.load_threads(review_id)?;

        let Some(resolved) = resolved else {
            return threads::resolution(&mut threads, thread_id);
        };

        let resolution = threads::set_resolved(&mut threads, thread_id, resolved, by)?;
        self.store.save_threads(review_id, &threads)?;

        tracing::info!(
            review_id = %review_id,
            thread_id = %thread_id,
            resolved,
            by = %by,
            "Thread updated"
        );
        Ok(resolution)
    }

    /// Append a reply to a thread
    pub async fn add_reply(
        &self,
        review_id: &str,
        thread_id: &str,
        body: &str,
        author: Author,
    ) -> Result<CommentReply> {
        let _guard = self.review_locks.lock(review_id).await;
        self.load_review(review_id)?;
        let mut threads = self.load_threads(review_id)?;

        let reply = threads::add_reply(&mut threads, thread_id, body, author)?;
        self.store.save_threads(review_id, &threads)?;

        tracing::info!(
            review_id = %review_id,
            thread_id = %thread_id,
            reply_id = %reply.id,
            author = %author,
            "Reply added"
        );
        Ok(reply)
    }

    /// Record the reviewer's decision
    pub async fn submit(&self, review_id: &str, decision: ReviewDecision) -> Result<Submission> {
        let _guard = self.review_locks.lock(review_id).await;
        let mut review = self.load_review(review_id)?;

        state::submit(&mut review, decision)?;
        self.store.save(&review)?;

        tracing::info!(
            review_id = %review_id,
            decision = %decision,
            status = %review.status,
            "Review submitted"
        );

        Ok(Submission {
            id: review.id,
            status: review.status,
            current_round: review.current_round,
            decision,
            submitted_at: review.updated_at,
        })
    }

    /// Start the next round of a review with changes requested
    pub async fn resubmit(&self, review_id: &str, message: Option<String>) -> Result<Review> {
        let _guard = self.review_locks.lock(review_id).await;
        let mut review = self.load_review(review_id)?;

        state::resubmit(&mut review, message)?;
        self.store.save(&review)?;

        tracing::info!(review_id = %review_id, round = review.current_round, "Review resubmitted");
        Ok(review)
    }

    /// Status of a review with thread counts
    pub async fn status_report(&self, review_id: &str) -> Result<ReviewStatusReport> {
        let review = self.load_review(review_id)?;
        let threads = self.load_threads(review_id)?;

        let resolved_count = threads.iter().filter(|t| t.resolved).count();

        Ok(ReviewStatusReport {
            review_id: review.id,
            status: review.status,
            current_round: review.current_round,
            decision: review.last_decision,
            pending_count: threads.len() - resolved_count,
            resolved_count,
            threads: threads.iter().map(ThreadSummary::from).collect(),
        })
    }
}
