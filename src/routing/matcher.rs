//! Path pattern matching.
//!
//! # Responsibilities
//! - Compare a `/`-separated pattern against a concrete request path
//! - Treat `:name` segments as single-segment wildcards
//! - Extract the captured values of those segments
//!
//! # Design Decisions
//! - Segment counts must be equal; there is no multi-segment wildcard
//! - Literal segments are compared case-sensitively, byte for byte
//! - No regex in the hot path

use std::collections::HashMap;

/// Path parameter name → captured segment, for one request.
pub type ParameterMap = HashMap<String, String>;

/// Marker prefix for parameter segments.
const PARAM_PREFIX: char = ':';

/// Returns true if `path` matches `pattern` segment by segment.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (Some(expected), Some(actual)) => {
                if !expected.starts_with(PARAM_PREFIX) && expected != actual {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Build the parameter map for a pattern/path pair.
///
/// Only meaningful once [`path_matches`] has returned true for the pair;
/// segments beyond the shorter of the two are ignored.
pub fn extract_params(pattern: &str, path: &str) -> ParameterMap {
    pattern
        .split('/')
        .zip(path.split('/'))
        .filter_map(|(segment, value)| {
            segment
                .strip_prefix(PARAM_PREFIX)
                .map(|name| (name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_segment_matches_any_value() {
        assert!(path_matches("/api/users/:id", "/api/users/42"));
        assert!(path_matches("/api/users/:id", "/api/users/abc-def"));
    }

    #[test]
    fn test_segment_count_must_match() {
        assert!(!path_matches("/api/users/:id", "/api/users/42/extra"));
        assert!(!path_matches("/api/users/:id", "/api/users"));
        // trailing slash adds an empty segment
        assert!(!path_matches("/api/users", "/api/users/"));
    }

    #[test]
    fn test_literal_mismatch_rejects() {
        assert!(!path_matches("/api/users/:id", "/api/orders/42"));
        assert!(!path_matches("/api/Users", "/api/users"));
        assert!(path_matches("/", "/"));
    }

    #[test]
    fn test_extract_params() {
        let params = extract_params("/api/:org/users/:id", "/api/acme/users/42");
        assert_eq!(params.len(), 2);
        assert_eq!(params["org"], "acme");
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn test_extract_params_is_verbatim() {
        let params = extract_params("/files/:name", "/files/report%202024.pdf");
        assert_eq!(params["name"], "report%202024.pdf");
    }

    #[test]
    fn test_literal_pattern_has_no_params() {
        assert!(extract_params("/api/hello", "/api/hello").is_empty());
    }
}
