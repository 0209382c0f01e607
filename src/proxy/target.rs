//! The upstream a request is forwarded to.

use std::time::Duration;

use axum::http::{uri::PathAndQuery, HeaderValue, Uri};
use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxySettings, RewriteRule};
use crate::proxy::rewrite::{rewrite_path, PathRewrite};

/// Why an upstream target was rejected.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid target URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported target scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("target URL {0:?} has no host")]
    MissingHost(String),

    #[error("invalid path rewrite {pattern:?}: {source}")]
    InvalidRewrite {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot build upstream URI: {0}")]
    InvalidUri(String),
}

/// Base URL, change-origin flag, rewrite rules and timeout, validated together.
///
/// Immutable: a configuration change builds a new target and swaps it in.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    base_url: Url,
    authority: String,
    change_origin: bool,
    rewrites: Vec<PathRewrite>,
    timeout: Duration,
}

impl UpstreamTarget {
    /// Parse and validate an upstream base URL.
    pub fn parse_base_url(raw: &str) -> Result<Url, TargetError> {
        let url = Url::parse(raw.trim()).map_err(|source| TargetError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(TargetError::UnsupportedScheme(url.scheme().to_string()));
        }
        if matches!(url.host_str(), None | Some("")) {
            return Err(TargetError::MissingHost(raw.to_string()));
        }
        Ok(url)
    }

    pub fn from_settings(settings: &ProxySettings) -> Result<Self, TargetError> {
        let base_url = Self::parse_base_url(&settings.target)?;
        let rewrites = compile_rules(&settings.path_rewrite)?;
        Ok(Self::assemble(
            base_url,
            settings.change_origin,
            rewrites,
            Duration::from_secs(settings.timeout_secs.max(1)),
        ))
    }

    fn assemble(base_url: Url, change_origin: bool, rewrites: Vec<PathRewrite>, timeout: Duration) -> Self {
        let host = base_url.host_str().unwrap_or_default();
        let authority = match base_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Self {
            base_url,
            authority,
            change_origin,
            rewrites,
            timeout,
        }
    }

    /// Same settings, new base URL.
    pub fn with_base_url(&self, raw: &str) -> Result<Self, TargetError> {
        let base_url = Self::parse_base_url(raw)?;
        Ok(Self::assemble(base_url, self.change_origin, self.rewrites.clone(), self.timeout))
    }

    /// Same settings, new rewrite rules.
    pub fn with_rewrites(&self, rules: &[RewriteRule]) -> Result<Self, TargetError> {
        let rewrites = compile_rules(rules)?;
        Ok(Self::assemble(self.base_url.clone(), self.change_origin, rewrites, self.timeout))
    }

    /// Same settings, new change-origin flag.
    pub fn with_change_origin(&self, change_origin: bool) -> Self {
        Self {
            change_origin,
            ..self.clone()
        }
    }

    pub fn url(&self) -> &Url {
        &self.base_url
    }

    /// `host[:port]` of the upstream.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn rewrite_rules(&self) -> Vec<RewriteRule> {
        self.rewrites.iter().map(PathRewrite::to_rule).collect()
    }

    /// `Host` header value used when change-origin is on.
    pub fn host_header(&self) -> Result<HeaderValue, TargetError> {
        HeaderValue::from_str(&self.authority).map_err(|e| TargetError::InvalidUri(e.to_string()))
    }

    /// Outbound path: rewrite rules applied, then joined under the base URL's path.
    pub fn outbound_path(&self, path: &str) -> String {
        let rewritten = rewrite_path(&self.rewrites, path);
        let base = self.base_url.path().trim_end_matches('/');

        let mut joined = String::with_capacity(base.len() + rewritten.len() + 1);
        joined.push_str(base);
        if !rewritten.starts_with('/') {
            joined.push('/');
        }
        joined.push_str(&rewritten);
        joined
    }

    /// Absolute URI for the outbound request.
    pub fn upstream_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, TargetError> {
        let mut path_and_query = self.outbound_path(path);
        if let Some(query) = query {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }
        let path_and_query = PathAndQuery::try_from(path_and_query)
            .map_err(|e| TargetError::InvalidUri(e.to_string()))?;

        Uri::builder()
            .scheme(self.base_url.scheme())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| TargetError::InvalidUri(e.to_string()))
    }
}

fn compile_rules(rules: &[RewriteRule]) -> Result<Vec<PathRewrite>, TargetError> {
    rules
        .iter()
        .map(|rule| {
            PathRewrite::compile(rule).map_err(|source| TargetError::InvalidRewrite {
                pattern: rule.pattern.clone(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(target: &str) -> ProxySettings {
        ProxySettings {
            target: target.to_string(),
            change_origin: true,
            timeout_secs: 5,
            path_rewrite: vec![RewriteRule {
                pattern: "^/api".to_string(),
                replacement: String::new(),
            }],
        }
    }

    #[test]
    fn rejects_non_urls() {
        assert!(matches!(
            UpstreamTarget::parse_base_url("not a url"),
            Err(TargetError::InvalidUrl { .. })
        ));
        assert!(matches!(
            UpstreamTarget::parse_base_url("ftp://example.com"),
            Err(TargetError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn rewrites_then_joins_under_base_path() {
        let target = UpstreamTarget::from_settings(&settings("http://127.0.0.1:8080/v1")).unwrap();
        let uri = target.upstream_uri("/api/products", Some("page=2")).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:8080/v1/products?page=2");
    }

    #[test]
    fn fully_stripped_path_becomes_root() {
        let target = UpstreamTarget::from_settings(&settings("https://api.example.com")).unwrap();
        assert_eq!(target.outbound_path("/api"), "/");
        assert_eq!(target.authority(), "api.example.com");
        assert_eq!(target.upstream_uri("/api", None).unwrap().to_string(), "https://api.example.com/");
    }

    #[test]
    fn with_base_url_keeps_other_settings() {
        let target = UpstreamTarget::from_settings(&settings("http://localhost:1")).unwrap();
        let next = target.with_base_url("http://localhost:2").unwrap();
        assert_eq!(next.authority(), "localhost:2");
        assert!(next.change_origin());
        assert_eq!(next.rewrite_rules(), target.rewrite_rules());
        assert!(target.with_base_url("::nope").is_err());
    }

    #[test]
    fn invalid_rewrite_rejected() {
        let target = UpstreamTarget::from_settings(&settings("http://localhost:1")).unwrap();
        let bad = [RewriteRule {
            pattern: "[".to_string(),
            replacement: String::new(),
        }];
        assert!(matches!(target.with_rewrites(&bad), Err(TargetError::InvalidRewrite { .. })));
    }
}
