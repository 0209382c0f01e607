//! Configuration schema definitions.
//!
//! Global settings live in `config.toml`; every feature group lives in its
//! own `<feature>.json`. All types derive Serde traits so the same structs are
//! used for loading, persisting and the admin API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of `config.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Public listener.
    pub server: ServerConfig,

    /// Upstream the unmatched traffic is forwarded to.
    pub proxy: ProxySettings,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Admin API listener.
    pub admin: AdminConfig,
}

/// Public listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or IP to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// `host:port` form suitable for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProxySettings {
    /// Base URL of the real service.
    pub target: String,

    /// Rewrite the outbound `Host` header to the target's host.
    pub change_origin: bool,

    /// Connect + response-head timeout for forwarded requests, in seconds.
    pub timeout_secs: u64,

    /// Path rewrites, applied in order.
    pub path_rewrite: Vec<RewriteRule>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            target: "https://api.real-server.com".to_string(),
            change_origin: true,
            timeout_secs: 30,
            path_rewrite: Vec::new(),
        }
    }
}

/// A single `pattern -> replacement` path rewrite.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RewriteRule {
    /// Regular expression matched against the request path.
    pub pattern: String,

    /// Replacement text; `$1`-style group references are expanded.
    #[serde(default)]
    pub replacement: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Install the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin API.
    pub enabled: bool,

    /// Admin API bind address.
    pub bind_address: String,

    /// Bearer token. Empty disables authentication.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:3001".to_string(),
            api_key: String::new(),
        }
    }
}

/// A named group of related mock endpoints, stored as one JSON file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeatureGroup {
    /// Feature name; also the file stem it is persisted under.
    #[serde(rename = "feature")]
    pub name: String,

    /// Endpoints in declaration order.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl FeatureGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoints: Vec::new(),
        }
    }

    pub fn endpoint(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    pub fn endpoint_mut(&mut self, id: &str) -> Option<&mut Endpoint> {
        self.endpoints.iter_mut().find(|e| e.id == id)
    }
}

/// One mocked route with its named response variants.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: String,
    pub method: String,

    /// Literal segments plus `:name` parameter segments.
    pub path: String,

    #[serde(default)]
    pub active: bool,

    /// Key into `responses` used when the endpoint is hit.
    pub default_response: String,

    #[serde(default)]
    pub responses: BTreeMap<String, ResponseSpec>,
}

/// One complete status/headers/body/delay combination.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResponseSpec {
    pub status: u16,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Arbitrary JSON body; strings may carry pre-serialized payloads.
    #[serde(default)]
    pub body: serde_json::Value,

    /// Artificial latency in milliseconds, applied by the dispatcher.
    #[serde(default)]
    pub delay: u64,
}

/// Everything read from a configuration directory in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSnapshot {
    pub global: GlobalConfig,
    pub features: Vec<FeatureGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_file_uses_camel_case_keys() {
        let raw = r#"{
            "feature": "users",
            "endpoints": [{
                "id": "get-user",
                "method": "GET",
                "path": "/api/users/:id",
                "active": true,
                "defaultResponse": "ok",
                "responses": {
                    "ok": {"status": 200, "headers": {"X-Mock": "1"}, "body": {"id": "{{params.id}}"}, "delay": 25}
                }
            }]
        }"#;
        let feature: FeatureGroup = serde_json::from_str(raw).unwrap();
        assert_eq!(feature.name, "users");
        let endpoint = &feature.endpoints[0];
        assert_eq!(endpoint.default_response, "ok");
        assert_eq!(endpoint.responses["ok"].delay, 25);
        assert_eq!(endpoint.responses["ok"].headers["X-Mock"], "1");

        let written = serde_json::to_value(&feature).unwrap();
        assert_eq!(written["endpoints"][0]["defaultResponse"], "ok");
    }

    #[test]
    fn global_config_defaults_fill_missing_sections() {
        let config: GlobalConfig = toml::from_str(
            r#"
            [proxy]
            target = "http://localhost:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.proxy.target, "http://localhost:8080");
        assert!(config.proxy.path_rewrite.is_empty());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.admin.bind_address, "127.0.0.1:3001");
    }

    #[test]
    fn rewrite_rules_keep_declared_order() {
        let config: GlobalConfig = toml::from_str(
            r#"
            [proxy]
            target = "http://localhost:8080"

            [[proxy.path_rewrite]]
            pattern = "^/api"
            replacement = ""

            [[proxy.path_rewrite]]
            pattern = "^/v1"
            replacement = "/v2"
            "#,
        )
        .unwrap();
        let patterns: Vec<_> = config.proxy.path_rewrite.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["^/api", "^/v1"]);
    }
}
