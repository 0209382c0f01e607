//! Admin API.
//!
//! JSON over HTTP on its own listener, exposing the engine's collaborator
//! API: feature/endpoint management, proxy settings and reload.

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::engine::Engine;
use crate::http::server::AppState;

pub use error::ApiError;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/features", get(list_features).post(create_feature))
        .route("/admin/features/{feature}", delete(delete_feature))
        .route("/admin/features/{feature}/endpoints", post(create_endpoint))
        .route("/admin/features/{feature}/endpoints/{id}", delete(delete_endpoint))
        .route("/admin/features/{feature}/endpoints/{id}/toggle", post(toggle_endpoint))
        .route("/admin/features/{feature}/endpoints/{id}/response", put(set_default_response))
        .route("/admin/proxy", get(get_proxy).put(update_proxy))
        .route("/admin/reload", post(reload))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API on `listener` until `shutdown` fires.
pub async fn serve(
    engine: Arc<Engine>,
    listener: TcpListener,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API starting");

    let app = setup_admin_router(AppState { engine });
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
