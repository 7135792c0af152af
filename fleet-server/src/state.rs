//! Application state for the review server.

use fleet_core::ReviewService;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state, built once per server and handed to the router.
#[derive(Debug)]
pub struct AppState {
    /// Review operations over the file store
    pub service: Arc<ReviewService>,

    /// Port the server is bound to
    pub port: u16,

    /// Server start time (for health checks)
    pub start_time: Instant,

    /// How often the browser client refreshes the document and threads
    pub poll_interval: Duration,
}

impl AppState {
    /// Create state for a server bound on `port`
    pub fn new(service: Arc<ReviewService>, port: u16, poll_interval: Duration) -> Self {
        Self {
            service,
            port,
            start_time: Instant::now(),
            poll_interval,
        }
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
