use thiserror::Error;

use crate::config::{ConfigError, ValidationError};
use crate::proxy::TargetError;

/// Why an engine operation was refused. State is unchanged whenever one is returned.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("feature {0} not found")]
    FeatureNotFound(String),

    #[error("endpoint {id} not found in feature {feature}")]
    EndpointNotFound { feature: String, id: String },

    #[error("feature {0} already exists")]
    DuplicateFeature(String),

    #[error("endpoint {id} already exists in feature {feature}")]
    DuplicateEndpoint { feature: String, id: String },

    #[error("response {response} not found for endpoint {endpoint}")]
    ResponseNotFound { endpoint: String, response: String },

    #[error("invalid feature: {}", join(.0))]
    InvalidFeature(Vec<ValidationError>),

    #[error("invalid endpoint: {}", join(.0))]
    InvalidEndpoint(Vec<ValidationError>),

    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    #[error("failed to persist configuration: {0}")]
    Persist(#[from] ConfigError),

    #[error("failed to load configuration: {0}")]
    Load(#[source] ConfigError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
