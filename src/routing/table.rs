//! Route table lookup.
//!
//! # Responsibilities
//! - Hold the feature groups in declaration order
//! - Find the first endpoint matching a method and path
//! - Return the matched endpoint with its feature name, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable once published; mutations build a new table and swap it in
//! - O(n) scan over endpoints (acceptable for hand-written mock sets)
//! - First declared wins; no specificity ranking

use serde::Serialize;

use crate::config::schema::{Endpoint, FeatureGroup};
use crate::routing::matcher::{extract_params, path_matches, ParameterMap};

/// All feature groups, in the order they were loaded or created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteTable {
    features: Vec<FeatureGroup>,
}

/// A successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub endpoint: &'a Endpoint,
    pub feature: &'a str,
}

impl RouteMatch<'_> {
    /// Path parameters captured by this match.
    pub fn params(&self, path: &str) -> ParameterMap {
        extract_params(&self.endpoint.path, path)
    }
}

impl RouteTable {
    pub fn new(features: Vec<FeatureGroup>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &[FeatureGroup] {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureGroup> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn endpoint(&self, feature: &str, id: &str) -> Option<&Endpoint> {
        self.feature(feature).and_then(|f| f.endpoint(id))
    }

    /// Number of endpoints across all features.
    pub fn endpoint_count(&self) -> usize {
        self.features.iter().map(|f| f.endpoints.len()).sum()
    }

    /// Find the first endpoint whose method and path pattern fit the request.
    ///
    /// Inactive endpoints are still returned; deciding what to do with them
    /// is the dispatcher's job.
    pub fn find_endpoint(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        let found = self.features.iter().find_map(|feature| {
            feature
                .endpoints
                .iter()
                .find(|e| e.method == method && path_matches(&e.path, path))
                .map(|endpoint| RouteMatch {
                    endpoint,
                    feature: feature.name.as_str(),
                })
        });

        if found.is_none() {
            tracing::debug!(method = %method, path = %path, "No matching endpoint");
        }
        found
    }

    /// Replace a feature group by name, or append it if new.
    pub(crate) fn upsert_feature(&mut self, feature: FeatureGroup) {
        match self.features.iter_mut().find(|f| f.name == feature.name) {
            Some(slot) => *slot = feature,
            None => self.features.push(feature),
        }
    }

    pub(crate) fn remove_feature(&mut self, name: &str) -> Option<FeatureGroup> {
        let index = self.features.iter().position(|f| f.name == name)?;
        Some(self.features.remove(index))
    }
}
