//! Turning a rendered [`ResponseSpec`] into an HTTP response.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::config::schema::ResponseSpec;
use crate::mock::renderer::RenderError;

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Encode a body value for the wire, returning the default content type.
///
/// A string that is itself valid JSON is written as-is (pre-serialized
/// payload); any other string is written verbatim as text.
pub fn encode_body(body: &Value) -> (&'static str, String) {
    match body {
        Value::String(s) if serde_json::from_str::<Value>(s).is_ok() => (JSON_CONTENT_TYPE, s.clone()),
        Value::String(s) => (TEXT_CONTENT_TYPE, s.clone()),
        other => (JSON_CONTENT_TYPE, other.to_string()),
    }
}

/// Build the HTTP response for a rendered mock.
///
/// Headers declared on the response variant take precedence over the
/// default content type.
pub fn into_http_response(spec: &ResponseSpec) -> Response {
    let status = StatusCode::from_u16(spec.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (content_type, body) = encode_body(&spec.body);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &spec.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid mock response header"),
        }
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    response
}

/// 500 response for a mock that could not be rendered.
pub fn render_error_response(err: &RenderError) -> Response {
    let body = serde_json::json!({
        "error": format!("Failed to generate response: {}", err),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn spec(body: Value, headers: &[(&str, &str)]) -> ResponseSpec {
        ResponseSpec {
            status: 404,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            body,
            delay: 0,
        }
    }

    #[test]
    fn structured_body_is_json() {
        assert_eq!(encode_body(&json!({"a": 1})), (JSON_CONTENT_TYPE, r#"{"a":1}"#.to_string()));
        assert_eq!(encode_body(&Value::Null), (JSON_CONTENT_TYPE, "null".to_string()));
    }

    #[test]
    fn preserialized_string_is_written_raw() {
        let body = json!(r#"{"already": "json"}"#);
        assert_eq!(encode_body(&body), (JSON_CONTENT_TYPE, r#"{"already": "json"}"#.to_string()));
    }

    #[test]
    fn plain_string_is_written_verbatim() {
        assert_eq!(encode_body(&json!("not json")), (TEXT_CONTENT_TYPE, "not json".to_string()));
    }

    #[test]
    fn declared_headers_win() {
        let response = into_http_response(&spec(json!("<p>hi</p>"), &[("Content-Type", "text/html"), ("X-Id", "1")]));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(response.headers()["x-id"], "1");
    }

    #[test]
    fn default_content_type_applied() {
        let response = into_http_response(&spec(json!([1, 2]), &[]));
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);
    }

    #[test]
    fn invalid_header_skipped() {
        let response = into_http_response(&spec(json!(null), &[("bad header", "x")]));
        assert_eq!(response.headers().len(), 1);
    }
}
