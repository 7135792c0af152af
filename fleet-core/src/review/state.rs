//! Review lifecycle state machine
//!
//! ```text
//!                 submit(approve)
//!   pending_review ───────────────▶ approved
//!      ▲    │
//!      │    │ submit(request_changes)
//!      │    ▼
//!   changes_requested
//!      │
//!      └── resubmit (round += 1)
//! ```

use chrono::Utc;
use fleet_store::{Review, ReviewDecision, ReviewStatus};
use std::fmt::Debug;

use crate::error::{Error, Result};

/// A state machine over a table of allowed transitions
#[derive(Debug, Clone)]
pub struct StateMachine<P: Clone + PartialEq + Debug> {
    current_phase: P,
    valid_transitions: Vec<(P, P)>,
}

impl<P: Clone + PartialEq + Debug> StateMachine<P> {
    /// Create a new state machine with the given initial phase
    pub fn new(initial_phase: P) -> Self {
        Self {
            current_phase: initial_phase,
            valid_transitions: Vec::new(),
        }
    }

    /// Add a valid transition from one phase to another
    pub fn add_transition(mut self, from: P, to: P) -> Self {
        self.valid_transitions.push((from, to));
        self
    }

    /// Get the current phase
    pub fn current_phase(&self) -> &P {
        &self.current_phase
    }

    /// Check if a transition to the given phase is valid
    pub fn can_transition_to(&self, phase: &P) -> bool {
        self.valid_transitions
            .iter()
            .any(|(f, t)| f == &self.current_phase && t == phase)
    }

    /// First phase the table allows a transition from into `phase`
    pub fn source_of(&self, phase: &P) -> Option<&P> {
        self.valid_transitions
            .iter()
            .find(|(_, t)| t == phase)
            .map(|(f, _)| f)
    }

    /// Attempt to transition to a new phase
    pub fn transition_to(&mut self, phase: P) -> Result<()> {
        if !self.can_transition_to(&phase) {
            return Err(Error::Other(format!(
                "Invalid transition from {:?} to {:?}",
                self.current_phase, phase
            )));
        }

        tracing::debug!(
            from = ?self.current_phase,
            to = ?phase,
            "Review state transition"
        );

        self.current_phase = phase;
        Ok(())
    }
}

/// State machine describing the legal review transitions, positioned at `status`
pub fn review_lifecycle(status: ReviewStatus) -> StateMachine<ReviewStatus> {
    StateMachine::new(status)
        .add_transition(ReviewStatus::PendingReview, ReviewStatus::Approved)
        .add_transition(ReviewStatus::PendingReview, ReviewStatus::ChangesRequested)
        .add_transition(ReviewStatus::ChangesRequested, ReviewStatus::PendingReview)
}

/// Record the reviewer's decision on a pending review
///
/// Fails with `InvalidState` and leaves the review untouched unless it is
/// `pending_review`.
pub fn submit(review: &mut Review, decision: ReviewDecision) -> Result<()> {
    review.status = advance(review, "submit", decision.target_status())?;
    review.last_decision = Some(decision);
    review.updated_at = Utc::now();
    Ok(())
}

/// Start the next review round after changes were requested
///
/// Fails with `InvalidState` and leaves the review untouched unless it is
/// `changes_requested`.
pub fn resubmit(review: &mut Review, message: Option<String>) -> Result<()> {
    review.status = advance(review, "resubmit", ReviewStatus::PendingReview)?;
    review.current_round += 1;
    review.message = message;
    review.last_decision = None;
    review.updated_at = Utc::now();
    Ok(())
}

/// Run `review` through the lifecycle table towards `target`
///
/// A move the table rejects becomes `InvalidState`, naming the state the
/// table would have accepted it from.
fn advance(review: &Review, action: &'static str, target: ReviewStatus) -> Result<ReviewStatus> {
    let mut lifecycle = review_lifecycle(review.status);

    if !lifecycle.can_transition_to(&target) {
        if let Some(&required) = lifecycle.source_of(&target) {
            return Err(Error::InvalidState {
                action,
                required,
                actual: review.status,
            });
        }
    }

    lifecycle.transition_to(target)?;
    Ok(*lifecycle.current_phase())
}

/// What a review request does given the latest review for the same document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// A review is already pending; return it unchanged
    Reuse,
    /// Changes were requested; start the next round
    Resubmit,
    /// No review yet, or the last one was approved; open a fresh one
    Create,
}

/// Decide how to handle a review request for a document
pub fn plan_request(existing: Option<&Review>) -> RequestAction {
    match existing.map(|review| review.status) {
        Some(ReviewStatus::PendingReview) => RequestAction::Reuse,
        Some(ReviewStatus::ChangesRequested) => RequestAction::Resubmit,
        Some(ReviewStatus::Approved) | None => RequestAction::Create,
    }
}
