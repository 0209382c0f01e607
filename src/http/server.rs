//! Public HTTP server.
//!
//! # Responsibilities
//! - Build the Axum router: one catch-all route, any method
//! - Wire up middleware (request id, tracing, CORS)
//! - Serve until shutdown is signalled
//!
//! # Design Decisions
//! - No static routes: behavior comes entirely from the engine's Route Table
//! - Connect info is recorded so the proxy can set `X-Forwarded-For`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::http::cors::cors_middleware;
use crate::http::dispatch::dispatch;
use crate::http::request::{make_span, propagate_request_id, set_request_id};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// HTTP server for mocked and proxied traffic.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(engine: Arc<Engine>) -> Self {
        let router = Self::build_router(AppState { engine });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(middleware::from_fn(cors_middleware))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(set_request_id())
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
