//! The catch-all Dispatcher.
//!
//! ```text
//! Idle → Matching → Rendering → (delay) → Responded
//!                 ↘ Proxying → Responded
//! ```
//! No retries: a render or forward failure ends that request only.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};

use crate::engine::{Mediation, ProxyReason};
use crate::http::server::AppState;
use crate::mock::{into_http_response, render_error_response};
use crate::observability::metrics;

pub async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match state.engine.mediate(method.as_str(), &path) {
        Mediation::Mock {
            feature,
            endpoint,
            rendered: Ok(spec),
        } => {
            if spec.delay > 0 {
                tokio::time::sleep(Duration::from_millis(spec.delay)).await;
            }
            let response = into_http_response(&spec);

            tracing::info!(
                feature = %feature,
                endpoint = %endpoint,
                status = response.status().as_u16(),
                delay_ms = spec.delay,
                "Mocked request"
            );
            metrics::record_request(metrics::MODE_MOCK, response.status().as_u16(), start);
            response
        }
        Mediation::Mock {
            feature,
            endpoint,
            rendered: Err(e),
        } => {
            tracing::error!(feature = %feature, endpoint = %endpoint, error = %e, "Failed to render mock response");
            let response = render_error_response(&e);
            metrics::record_request(metrics::MODE_MOCK, response.status().as_u16(), start);
            response
        }
        Mediation::Proxy { reason, target } => {
            match &reason {
                ProxyReason::NoMatch => tracing::debug!(method = %method, path = %path, "No mock, proxying"),
                ProxyReason::Inactive { feature, endpoint } => tracing::debug!(
                    feature = %feature,
                    endpoint = %endpoint,
                    "Endpoint inactive, proxying"
                ),
            }
            state.engine.forward_to(request, &target).await
        }
    }
}
