//! Fleet Core - document review lifecycle for OpenFleet
//!
//! This crate holds the review state machine, comment thread rules, the
//! `ReviewService` that applies them to the file store, and the tool bindings
//! an agent runtime calls to request and follow reviews.

pub mod config;
pub mod error;
pub mod review;
pub mod tools;

pub use config::{Config, ServerConfig, StorageConfig, UiConfig};
pub use error::{Error, ErrorKind, Result};
pub use review::{
    RequestAction, RequestOutcome, Resolution, ReviewService, ReviewStatusReport, Submission,
    ThreadSummary,
};
pub use tools::{Tool, ToolDefinition, ToolRegistry};
