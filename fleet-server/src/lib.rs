//! HTTP review server for OpenFleet.
//!
//! Serves the review API and the browser review page over a shared
//! `ReviewService`.
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/reviews` - Request review of a document
//! - `GET /api/reviews/{id}` - Get a review
//! - `GET /api/reviews/{id}/document` - Current document content
//! - `GET|POST /api/reviews/{id}/threads` - List or open comment threads
//! - `PATCH /api/reviews/{id}/threads/{thread_id}` - Resolve or reopen a thread
//! - `POST /api/reviews/{id}/threads/{thread_id}/replies` - Reply to a thread
//! - `POST /api/reviews/{id}/submit` - Approve or request changes
//! - `POST /api/reviews/{id}/resubmit` - Start the next round
//! - `GET /review/{id}` - Browser review page

pub mod error;
pub mod routes;
pub mod state;
pub mod ui;

use axum::{
    routing::{get, patch, post},
    Router,
};
use fleet_core::{Config, ReviewService, ServerConfig};
use fleet_store::ReviewStore;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use error::{ApiError, Error, Result};
pub use state::AppState;

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/reviews", post(routes::create_review))
        .route("/api/reviews/{id}", get(routes::get_review))
        .route("/api/reviews/{id}/document", get(routes::get_document))
        .route(
            "/api/reviews/{id}/threads",
            get(routes::list_threads).post(routes::create_thread),
        )
        .route(
            "/api/reviews/{id}/threads/{thread_id}",
            patch(routes::update_thread),
        )
        .route(
            "/api/reviews/{id}/threads/{thread_id}/replies",
            post(routes::add_reply),
        )
        .route("/api/reviews/{id}/submit", post(routes::submit_review))
        .route("/api/reviews/{id}/resubmit", post(routes::resubmit_review))
        .route("/review/{id}", get(routes::review_page))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `host:port`, moving to the next port while the current one is in use
///
/// Returns the listener and the port it is bound to. Errors other than
/// `AddrInUse` fail immediately.
pub async fn bind_with_retry(host: &str, port: u16, attempts: u16) -> Result<(TcpListener, u16)> {
    for offset in 0..attempts {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };

        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => {
                let bound = listener.local_addr()?.port();
                return Ok((listener, bound));
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                debug!(port = candidate, "Port in use, trying next");
            }
            Err(source) => {
                return Err(Error::Bind {
                    addr: format!("{}:{}", host, candidate),
                    source,
                });
            }
        }
    }

    Err(Error::NoAvailablePort {
        start: port,
        attempts,
    })
}

/// Review server configured from `Config`
#[derive(Debug, Clone)]
pub struct ReviewServer {
    config: Config,
}

impl ReviewServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bind a port and start serving in the background
    pub async fn start(self) -> Result<RunningServer> {
        let server = &self.config.server;
        let (listener, port) =
            bind_with_retry(&server.host, server.port, server.max_port_attempts).await?;

        let url = ServerConfig::base_url(port);
        let store = ReviewStore::new(self.config.storage.reviews_dir());
        let service = Arc::new(ReviewService::new(store, url.clone()));
        let state = Arc::new(AppState::new(
            Arc::clone(&service),
            port,
            self.config.ui.poll_interval,
        ));
        let router = create_router(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(
            port,
            url = %url,
            reviews_dir = %self.config.storage.reviews_dir().display(),
            "Review server started"
        );

        Ok(RunningServer {
            port,
            url,
            service,
            shutdown: shutdown_tx,
            handle,
        })
    }
}

/// Handle to a server started with [`ReviewServer::start`]
#[derive(Debug)]
pub struct RunningServer {
    port: u16,
    url: String,
    service: Arc<ReviewService>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    /// Port the server is bound to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL, `http://localhost:<port>`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Service shared with the HTTP handlers
    pub fn service(&self) -> Arc<ReviewService> {
        Arc::clone(&self.service)
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        let served = self
            .handle
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        served?;

        info!(port = self.port, "Review server stopped");
        Ok(())
    }
}
