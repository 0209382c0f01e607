use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::error::ApiError;
use crate::config::schema::{Endpoint, RewriteRule};
use crate::http::server::AppState;
use crate::routing::RouteTable;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub target: String,
    pub features: usize,
    pub endpoints: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFeature {
    pub feature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResult {
    pub feature: String,
    pub id: String,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyView {
    pub target: String,
    pub change_origin: bool,
    pub path_rewrite: Vec<RewriteRule>,
}

/// Partial proxy update; absent fields are left alone.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_origin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_rewrite: Option<Vec<RewriteRule>>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let routes = state.engine.routes();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        target: state.engine.target_url(),
        features: routes.features().len(),
        endpoints: routes.endpoint_count(),
    })
}

pub async fn list_features(State(state): State<AppState>) -> Json<RouteTable> {
    Json(RouteTable::clone(&state.engine.routes()))
}

pub async fn create_feature(
    State(state): State<AppState>,
    Json(body): Json<CreateFeature>,
) -> Result<StatusCode, ApiError> {
    state.engine.create_feature(&body.feature)?;
    Ok(StatusCode::CREATED)
}

pub async fn delete_feature(
    State(state): State<AppState>,
    Path(feature): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_feature(&feature)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_endpoint(
    State(state): State<AppState>,
    Path(feature): Path<String>,
    Json(endpoint): Json<Endpoint>,
) -> Result<(StatusCode, Json<Endpoint>), ApiError> {
    state.engine.create_endpoint(&feature, endpoint.clone())?;
    Ok((StatusCode::CREATED, Json(endpoint)))
}

pub async fn delete_endpoint(
    State(state): State<AppState>,
    Path((feature, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_endpoint(&feature, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_endpoint(
    State(state): State<AppState>,
    Path((feature, id)): Path<(String, String)>,
) -> Result<Json<ToggleResult>, ApiError> {
    let active = state.engine.toggle_active(&feature, &id)?;
    Ok(Json(ToggleResult { feature, id, active }))
}

pub async fn set_default_response(
    State(state): State<AppState>,
    Path((feature, id)): Path<(String, String)>,
    Json(body): Json<SetResponse>,
) -> Result<StatusCode, ApiError> {
    state.engine.set_default_response(&feature, &id, &body.response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_proxy(State(state): State<AppState>) -> Json<ProxyView> {
    Json(proxy_view(&state))
}

pub async fn update_proxy(
    State(state): State<AppState>,
    Json(update): Json<ProxyUpdate>,
) -> Result<Json<ProxyView>, ApiError> {
    if let Some(target) = &update.target {
        state.engine.update_target(target)?;
    }
    if let Some(change_origin) = update.change_origin {
        state.engine.set_change_origin(change_origin)?;
    }
    if let Some(rules) = update.path_rewrite {
        state.engine.set_path_rewrite(rules)?;
    }
    Ok(Json(proxy_view(&state)))
}

pub async fn reload(State(state): State<AppState>) -> Result<Json<SystemStatus>, ApiError> {
    state.engine.reload()?;
    Ok(get_status(State(state)).await)
}

fn proxy_view(state: &AppState) -> ProxyView {
    ProxyView {
        target: state.engine.target_url(),
        change_origin: state.engine.change_origin(),
        path_rewrite: state.engine.path_rewrite(),
    }
}
