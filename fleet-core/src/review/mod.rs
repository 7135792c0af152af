//! Document review lifecycle
//!
//! This module holds the review state machine, the comment thread rules and
//! the `ReviewService` that applies both to the file store.

pub mod service;
pub mod state;
pub mod threads;

pub use service::{
    RequestOutcome, ReviewService, ReviewStatusReport, Submission, ThreadSummary,
};
pub use state::{plan_request, RequestAction, StateMachine};
pub use threads::Resolution;
