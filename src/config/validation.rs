//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default response names exist)
//! - Validate value ranges (status codes, methods, path shape)
//! - Detect duplicate feature names and endpoint ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure: input → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, on load and on mutation

use std::collections::HashSet;

use axum::http::Method;
use regex::Regex;
use thiserror::Error;

use crate::config::schema::{ConfigSnapshot, Endpoint, FeatureGroup, GlobalConfig};
use crate::proxy::UpstreamTarget;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("feature name cannot be empty")]
    EmptyFeatureName,

    #[error("feature name {0:?} cannot be used as a file name")]
    InvalidFeatureName(String),

    #[error("feature {0} is defined more than once")]
    DuplicateFeature(String),

    #[error("feature {feature}: endpoint id cannot be empty")]
    EmptyEndpointId { feature: String },

    #[error("feature {feature}: endpoint {id} is defined more than once")]
    DuplicateEndpoint { feature: String, id: String },

    #[error("endpoint {id}: invalid method {method:?}")]
    InvalidMethod { id: String, method: String },

    #[error("endpoint {id}: path {path:?} must start with '/'")]
    InvalidPath { id: String, path: String },

    #[error("endpoint {id}: default response {name:?} is not one of its responses")]
    MissingDefaultResponse { id: String, name: String },

    #[error("endpoint {id}: response {name:?} has invalid status {status}")]
    InvalidStatus { id: String, name: String, status: u16 },

    #[error("proxy target: {0}")]
    InvalidTarget(String),

    #[error("path rewrite {pattern:?}: {reason}")]
    InvalidRewrite { pattern: String, reason: String },
}

/// Validate a full snapshot: global settings plus every feature.
pub fn validate_snapshot(snapshot: &ConfigSnapshot) -> Result<(), Vec<ValidationError>> {
    let mut errors = global_errors(&snapshot.global);

    let mut seen = HashSet::new();
    for feature in &snapshot.features {
        if !seen.insert(feature.name.as_str()) {
            errors.push(ValidationError::DuplicateFeature(feature.name.clone()));
        }
        errors.extend(feature_errors(feature));
    }

    into_result(errors)
}

/// Validate the global settings.
pub fn validate_global(global: &GlobalConfig) -> Result<(), Vec<ValidationError>> {
    into_result(global_errors(global))
}

/// Validate one feature group in isolation.
pub fn validate_feature(feature: &FeatureGroup) -> Result<(), Vec<ValidationError>> {
    into_result(feature_errors(feature))
}

/// Validate one endpoint in isolation.
pub fn validate_endpoint(endpoint: &Endpoint) -> Result<(), Vec<ValidationError>> {
    into_result(endpoint_errors(endpoint))
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn global_errors(global: &GlobalConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = UpstreamTarget::parse_base_url(&global.proxy.target) {
        errors.push(ValidationError::InvalidTarget(e.to_string()));
    }

    for rule in &global.proxy.path_rewrite {
        if let Err(e) = Regex::new(&rule.pattern) {
            errors.push(ValidationError::InvalidRewrite {
                pattern: rule.pattern.clone(),
                reason: e.to_string(),
            });
        }
    }

    errors
}

fn feature_errors(feature: &FeatureGroup) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if feature.name.trim().is_empty() {
        errors.push(ValidationError::EmptyFeatureName);
    } else if feature.name.starts_with('.') || feature.name.contains(['/', '\\']) {
        errors.push(ValidationError::InvalidFeatureName(feature.name.clone()));
    }

    let mut ids = HashSet::new();
    for endpoint in &feature.endpoints {
        if endpoint.id.is_empty() {
            errors.push(ValidationError::EmptyEndpointId {
                feature: feature.name.clone(),
            });
        } else if !ids.insert(endpoint.id.as_str()) {
            errors.push(ValidationError::DuplicateEndpoint {
                feature: feature.name.clone(),
                id: endpoint.id.clone(),
            });
        }
        errors.extend(endpoint_errors(endpoint));
    }

    errors
}

fn endpoint_errors(endpoint: &Endpoint) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if endpoint.method.is_empty() || Method::from_bytes(endpoint.method.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidMethod {
            id: endpoint.id.clone(),
            method: endpoint.method.clone(),
        });
    }

    if !endpoint.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            id: endpoint.id.clone(),
            path: endpoint.path.clone(),
        });
    }

    if !endpoint.responses.contains_key(&endpoint.default_response) {
        errors.push(ValidationError::MissingDefaultResponse {
            id: endpoint.id.clone(),
            name: endpoint.default_response.clone(),
        });
    }

    for (name, response) in &endpoint.responses {
        if !(100..=999).contains(&response.status) {
            errors.push(ValidationError::InvalidStatus {
                id: endpoint.id.clone(),
                name: name.clone(),
                status: response.status,
            });
        }
    }

    errors
}
