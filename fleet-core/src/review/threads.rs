//! Comment thread and reply rules
//!
//! These functions validate input and mutate in-memory thread lists; callers
//! are responsible for loading and saving them.

use chrono::{DateTime, Utc};
use fleet_store::{Author, CommentReply, CommentThread, Review};

use crate::error::{Error, Result};

/// Resolution state of a thread after an update
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub thread_id: String,
    pub resolved: bool,
    pub resolved_by: Option<Author>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Resolution {
    fn of(thread: &CommentThread) -> Self {
        Self {
            thread_id: thread.id.clone(),
            resolved: thread.resolved,
            resolved_by: thread.resolved_by,
            resolved_at: thread.resolved_at,
        }
    }
}

fn require_body(body: &str, what: &'static str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(Error::BodyRequired(what));
    }
    Ok(())
}

/// Validate a 1-based inclusive line range
pub fn validate_lines(line_start: u32, line_end: u32) -> Result<()> {
    if line_start < 1 || line_end < 1 || line_start > line_end {
        return Err(Error::InvalidLines);
    }
    Ok(())
}

/// Open a new thread on `review`, tagged with its current round
pub fn create_thread(
    review: &Review,
    line_start: u32,
    line_end: u32,
    body: &str,
    author: Author,
) -> Result<CommentThread> {
    require_body(body, "Comment")?;
    validate_lines(line_start, line_end)?;

    Ok(CommentThread::new(
        &review.id,
        review.current_round,
        line_start,
        line_end,
        body,
        author,
    ))
}

/// Find a thread by ID
pub fn find_thread_mut<'a>(
    threads: &'a mut [CommentThread],
    thread_id: &str,
) -> Result<&'a mut CommentThread> {
    threads
        .iter_mut()
        .find(|t| t.id == thread_id)
        .ok_or_else(|| Error::ThreadNotFound(thread_id.to_string()))
}

/// Resolve or reopen a thread
///
/// Resolving stamps `resolved_by` and `resolved_at`; reopening clears both.
pub fn set_resolved(
    threads: &mut [CommentThread],
    thread_id: &str,
    resolved: bool,
    by: Author,
) -> Result<Resolution> {
    let thread = find_thread_mut(threads, thread_id)?;

    thread.resolved = resolved;
    if resolved {
        thread.resolved_by = Some(by);
        thread.resolved_at = Some(Utc::now());
    } else {
        thread.resolved_by = None;
        thread.resolved_at = None;
    }

    Ok(Resolution::of(thread))
}

/// Current resolution state of a thread without changing it
pub fn resolution(threads: &mut [CommentThread], thread_id: &str) -> Result<Resolution> {
    find_thread_mut(threads, thread_id).map(|thread| Resolution::of(thread))
}

/// Append a reply to a thread; resolution state is left as is
pub fn add_reply(
    threads: &mut [CommentThread],
    thread_id: &str,
    body: &str,
    author: Author,
) -> Result<CommentReply> {
    require_body(body, "Reply")?;
    let thread = find_thread_mut(threads, thread_id)?;

    let reply = CommentReply::new(&thread.id, body, author);
    thread.replies.push(reply.clone());
    Ok(reply)
}
