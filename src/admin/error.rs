use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::engine::EngineError;

/// An [`EngineError`] rendered as a JSON admin response.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::FeatureNotFound(_)
            | EngineError::EndpointNotFound { .. }
            | EngineError::ResponseNotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::DuplicateFeature(_) | EngineError::DuplicateEndpoint { .. } => StatusCode::CONFLICT,
            EngineError::InvalidFeature(_) | EngineError::InvalidEndpoint(_) | EngineError::InvalidTarget(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::Persist(_) | EngineError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Admin operation failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
