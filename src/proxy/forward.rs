//! Forwarding unmocked requests to the upstream.
//!
//! # Responsibilities
//! - Build the outbound request (rewritten path, Host, X-Forwarded-For)
//! - Relay the upstream response with its CORS headers removed
//! - Tunnel upgraded connections
//! - Map every failure to a 502 `Proxy Error`

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode, Version},
    response::{IntoResponse, Response},
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::observability::metrics;
use crate::proxy::headers;
use crate::proxy::target::{TargetError, UpstreamTarget};
use crate::proxy::upgrade;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Why a request could not be relayed.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid outbound request: {0}")]
    InvalidRequest(#[from] TargetError),

    #[error("failed to connect to upstream: {0}")]
    Connect(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),
}

impl ForwardError {
    /// Metric label for this failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidRequest(_) => "invalid_request",
            ForwardError::Connect(_) => "connect",
            ForwardError::Timeout(_) => "timeout",
            ForwardError::Upstream(_) => "upstream",
        }
    }
}

/// Reverse proxy client. The upstream is chosen per request by the caller.
pub struct ProxyMediator {
    client: HttpClient,
}

impl ProxyMediator {
    pub fn new() -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(CONNECT_TIMEOUT));

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        Self {
            client: Client::builder(TokioExecutor::new()).build(https),
        }
    }

    /// Relay one request. Never fails: upstream problems become a 502.
    pub async fn forward(&self, mut request: Request<Body>, target: &UpstreamTarget) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let wants_upgrade = headers::is_upgrade_request(request.headers());
        let client_upgrade = wants_upgrade.then(|| hyper::upgrade::on(&mut request));

        tracing::debug!(method = %method, path = %path, target = %target.url(), "Forwarding request");

        match self.send(request, target, wants_upgrade).await {
            Ok(mut response) => {
                let switching = response.status() == StatusCode::SWITCHING_PROTOCOLS;
                if switching {
                    if let Some(client_upgrade) = client_upgrade {
                        let upstream_upgrade = hyper::upgrade::on(&mut response);
                        upgrade::spawn_tunnel(client_upgrade, upstream_upgrade, path.clone());
                    }
                }

                let (mut parts, body) = response.into_parts();
                headers::strip_hop_by_hop(&mut parts.headers, switching);
                headers::strip_upstream_cors(&mut parts.headers);

                tracing::info!(
                    method = %method,
                    path = %path,
                    status = parts.status.as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Proxied request"
                );
                metrics::record_request(metrics::MODE_PROXY, parts.status.as_u16(), start);

                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(method = %method, path = %path, target = %target.url(), error = %e, "Proxy error");
                metrics::record_upstream_error(e.kind());
                metrics::record_request(metrics::MODE_PROXY, StatusCode::BAD_GATEWAY.as_u16(), start);
                bad_gateway()
            }
        }
    }

    async fn send(
        &self,
        request: Request<Body>,
        target: &UpstreamTarget,
        wants_upgrade: bool,
    ) -> Result<Response<hyper::body::Incoming>, ForwardError> {
        let outbound = prepare(request, target, wants_upgrade)?;

        match tokio::time::timeout(target.timeout(), self.client.request(outbound)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_connect() => Err(ForwardError::Connect(e)),
            Ok(Err(e)) => Err(ForwardError::Upstream(e)),
            Err(_) => Err(ForwardError::Timeout(target.timeout())),
        }
    }
}

/// Rebuild the inbound request for the upstream.
fn prepare(request: Request<Body>, target: &UpstreamTarget, wants_upgrade: bool) -> Result<Request<Body>, ForwardError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (mut parts, body) = request.into_parts();

    parts.uri = target.upstream_uri(parts.uri.path(), parts.uri.query())?;
    parts.version = Version::HTTP_11;
    parts.extensions = Default::default();

    headers::strip_hop_by_hop(&mut parts.headers, wants_upgrade);
    if let Some(ip) = peer {
        headers::append_forwarded_for(&mut parts.headers, ip);
    }
    if target.change_origin() {
        parts.headers.insert(header::HOST, target.host_header()?);
    }

    Ok(Request::from_parts(parts, body))
}

impl Default for ProxyMediator {
    fn default() -> Self {
        Self::new()
    }
}

fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Proxy Error",
    )
        .into_response()
}
