//! The per-request mock-or-proxy decision.

use std::sync::Arc;

use crate::config::schema::ResponseSpec;
use crate::engine::state::Engine;
use crate::mock::RenderError;
use crate::proxy::UpstreamTarget;

/// What the dispatcher should do with a request.
#[derive(Debug)]
pub enum Mediation {
    /// An active endpoint matched; answer locally after `delay`.
    Mock {
        feature: String,
        endpoint: String,
        rendered: Result<ResponseSpec, RenderError>,
    },
    /// Nothing matched, or the match is inactive. `target` belongs to the
    /// same snapshot the match was made against.
    Proxy {
        reason: ProxyReason,
        target: Arc<UpstreamTarget>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyReason {
    NoMatch,
    Inactive { feature: String, endpoint: String },
}

impl Engine {
    /// Decide how to answer `method path` against the current snapshot.
    ///
    /// Rendering happens here against one snapshot; no lock is held afterwards.
    pub fn mediate(&self, method: &str, path: &str) -> Mediation {
        let state = self.snapshot();
        let Some(found) = state.routes.find_endpoint(method, path) else {
            return Mediation::Proxy {
                reason: ProxyReason::NoMatch,
                target: state.target.clone(),
            };
        };

        if !found.endpoint.active {
            return Mediation::Proxy {
                reason: ProxyReason::Inactive {
                    feature: found.feature.to_string(),
                    endpoint: found.endpoint.id.clone(),
                },
                target: state.target.clone(),
            };
        }

        let params = found.params(path);
        Mediation::Mock {
            feature: found.feature.to_string(),
            endpoint: found.endpoint.id.clone(),
            rendered: self.renderer.render(found.endpoint, &params),
        }
    }
}
