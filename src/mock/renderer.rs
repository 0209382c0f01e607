//! Template rendering for mock response bodies.
//!
//! The selected response body is serialized to JSON text, rendered as a
//! Handlebars template against `{ params, now }`, and parsed back. Because
//! substitution happens after encoding, a parameter value containing `"` can
//! produce invalid JSON; that surfaces as [`RenderError::MalformedOutput`].

use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{Endpoint, ResponseSpec};
use crate::routing::ParameterMap;

/// Timestamp profile used for `{{now}}`.
pub const NOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Never emitted raw by the JSON encoder, which escapes control characters.
const BACKSLASH_STANDIN: &str = "\u{1}";

/// Why a mock response could not be produced.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("response {response} not found for endpoint {endpoint}")]
    ResponseNotFound { endpoint: String, response: String },

    #[error("template error: {0}")]
    Template(#[source] Box<handlebars::RenderError>),

    #[error("rendered body is not valid JSON: {0}")]
    MalformedOutput(#[source] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    params: &'a ParameterMap,
    now: String,
}

/// Renders an endpoint's default response for one request.
///
/// Stateless apart from the configured Handlebars registry, so a single
/// instance is shared by all request tasks.
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Unknown placeholders must fail, not render as empty strings.
        handlebars.set_strict_mode(true);
        // Output is JSON, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render the endpoint's default response with the current time.
    pub fn render(&self, endpoint: &Endpoint, params: &ParameterMap) -> Result<ResponseSpec, RenderError> {
        self.render_at(endpoint, params, Utc::now())
    }

    /// Render the endpoint's default response with a fixed `now`.
    pub fn render_at(
        &self,
        endpoint: &Endpoint,
        params: &ParameterMap,
        now: DateTime<Utc>,
    ) -> Result<ResponseSpec, RenderError> {
        let spec = endpoint
            .responses
            .get(&endpoint.default_response)
            .ok_or_else(|| RenderError::ResponseNotFound {
                endpoint: endpoint.id.clone(),
                response: endpoint.default_response.clone(),
            })?;

        let ctx = TemplateContext {
            params,
            now: now.format(NOW_FORMAT).to_string(),
        };

        Ok(ResponseSpec {
            body: self.render_body(&spec.body, &ctx)?,
            ..spec.clone()
        })
    }

    fn render_body(&self, body: &Value, ctx: &TemplateContext<'_>) -> Result<Value, RenderError> {
        let text = body.to_string();
        if !text.contains("{{") {
            return Ok(body.clone());
        }

        // JSON escapes backslashes, Handlebars treats `\{{` as its own escape.
        // Hide them from the template engine and put them back afterwards.
        let template = text.replace('\\', BACKSLASH_STANDIN);
        let rendered = self
            .handlebars
            .render_template(&template, ctx)
            .map_err(|e| RenderError::Template(Box::new(e)))?
            .replace(BACKSLASH_STANDIN, "\\");

        serde_json::from_str(&rendered).map_err(RenderError::MalformedOutput)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
