//! Storage layer for OpenFleet document reviews
//!
//! Provides the review data model and flat-file persistence of reviews and
//! their comment threads.

pub mod document;
pub mod error;
pub mod models;
pub mod store;

pub use document::{compute_hash, read_document, DocumentContent};
pub use error::{Error, Result};
pub use models::{
    generate_id, Author, CommentReply, CommentThread, Review, ReviewDecision, ReviewStatus,
    ThreadsFile,
};
pub use store::ReviewStore;
