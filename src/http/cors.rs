//! Permissive CORS for the public listener.
//!
//! Upstream CORS headers are already stripped by the proxy, so the values set
//! here are the only ones a caller sees.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS, PATCH";

/// Answer preflights directly and add CORS headers to every response.
pub async fn cors_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), "Answered preflight");
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut());
    response
}

pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
}
