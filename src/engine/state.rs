//! The owner of all shared mutable state.
//!
//! # Responsibilities
//! - Publish Route Table, global settings and upstream target as one snapshot
//! - Serialize mutations behind one writer lock
//! - Persist every mutation through the [`ConfigStore`] before publishing it
//!
//! # Design Decisions
//! - Readers never lock: they load one `Arc<EngineState>` and keep it for the request
//! - Mutations are copy-on-write: clone, edit, validate, persist, swap
//! - Every mutation and reload is a single `store`, so no reader sees a mix
//! - A failed step returns early, so nothing is published on error

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use axum::{body::Body, http::Request, response::Response};

use crate::config::schema::{ConfigSnapshot, Endpoint, FeatureGroup, GlobalConfig, ResponseSpec, RewriteRule};
use crate::config::validation::{validate_endpoint, validate_feature};
use crate::config::ConfigStore;
use crate::engine::error::EngineError;
use crate::mock::{RenderError, Renderer};
use crate::proxy::{ProxyMediator, UpstreamTarget};
use crate::routing::{extract_params, ParameterMap, RouteTable};

/// One consistent view of everything a request reads.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub routes: Arc<RouteTable>,
    pub global: Arc<GlobalConfig>,
    pub target: Arc<UpstreamTarget>,
}

impl EngineState {
    fn build(routes: RouteTable, global: GlobalConfig, target: UpstreamTarget) -> Self {
        Self {
            routes: Arc::new(routes),
            global: Arc::new(global),
            target: Arc::new(target),
        }
    }

    fn with_routes(&self, routes: RouteTable) -> Self {
        Self {
            routes: Arc::new(routes),
            ..self.clone()
        }
    }

    fn with_proxy(&self, global: GlobalConfig, target: UpstreamTarget) -> Self {
        Self {
            routes: self.routes.clone(),
            global: Arc::new(global),
            target: Arc::new(target),
        }
    }
}

/// Mock/proxy mediation engine.
pub struct Engine {
    store: Arc<dyn ConfigStore>,
    state: ArcSwap<EngineState>,
    proxy: ProxyMediator,
    pub(super) renderer: Renderer,
    writer: Mutex<()>,
}

impl Engine {
    /// Load the configuration from `store` and build an engine from it.
    pub fn open(store: Arc<dyn ConfigStore>) -> Result<Self, EngineError> {
        let snapshot = store.load().map_err(EngineError::Load)?;
        Self::with_snapshot(store, snapshot)
    }

    /// Build an engine from an already loaded snapshot.
    pub fn with_snapshot(store: Arc<dyn ConfigStore>, snapshot: ConfigSnapshot) -> Result<Self, EngineError> {
        let target = UpstreamTarget::from_settings(&snapshot.global.proxy)?;
        let routes = RouteTable::new(snapshot.features);

        tracing::info!(
            features = routes.features().len(),
            endpoints = routes.endpoint_count(),
            target = %target.url(),
            "Engine initialized"
        );

        Ok(Self {
            store,
            state: ArcSwap::from_pointee(EngineState::build(routes, snapshot.global, target)),
            proxy: ProxyMediator::new(),
            renderer: Renderer::new(),
            writer: Mutex::new(()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, next: EngineState) {
        self.state.store(Arc::new(next));
    }

    // ---- reads ----

    /// Current routes, settings and target, published together.
    pub fn snapshot(&self) -> Arc<EngineState> {
        self.state.load_full()
    }

    /// Current Route Table snapshot.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.state.load().routes.clone()
    }

    /// Current global settings snapshot.
    pub fn global(&self) -> Arc<GlobalConfig> {
        self.state.load().global.clone()
    }

    /// First endpoint matching `method` and `path`, with its feature name.
    pub fn find_endpoint(&self, method: &str, path: &str) -> Option<(Endpoint, String)> {
        let state = self.state.load();
        state
            .routes
            .find_endpoint(method, path)
            .map(|found| (found.endpoint.clone(), found.feature.to_string()))
    }

    /// Path parameters of `path` under `pattern`.
    pub fn extract_params(pattern: &str, path: &str) -> ParameterMap {
        extract_params(pattern, path)
    }

    /// Render an endpoint's default response.
    pub fn render(&self, endpoint: &Endpoint, params: &ParameterMap) -> Result<ResponseSpec, RenderError> {
        self.renderer.render(endpoint, params)
    }

    /// Relay a request to the current upstream.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let target = self.state.load().target.clone();
        self.proxy.forward(request, &target).await
    }

    /// Relay a request to the upstream of an earlier snapshot.
    pub async fn forward_to(&self, request: Request<Body>, target: &UpstreamTarget) -> Response {
        self.proxy.forward(request, target).await
    }

    pub fn target_url(&self) -> String {
        self.state.load().target.url().to_string()
    }

    pub fn path_rewrite(&self) -> Vec<RewriteRule> {
        self.state.load().target.rewrite_rules()
    }

    pub fn change_origin(&self) -> bool {
        self.state.load().target.change_origin()
    }

    /// `host:port` the public server binds to.
    pub fn server_address(&self) -> String {
        self.state.load().global.server.address()
    }

    // ---- proxy settings ----

    /// Point the proxy at a new upstream. An invalid URL changes nothing.
    pub fn update_target(&self, url: &str) -> Result<(), EngineError> {
        let _guard = self.lock();
        let current = self.state.load_full();
        let next = current.target.with_base_url(url)?;

        let mut global = GlobalConfig::clone(&current.global);
        global.proxy.target = next.url().to_string();

        let target_url = global.proxy.target.clone();
        self.publish_proxy(&current, global, next)?;

        tracing::info!(target_url = %target_url, "Proxy target updated");
        Ok(())
    }

    /// Replace the ordered path-rewrite rules.
    pub fn set_path_rewrite(&self, rules: Vec<RewriteRule>) -> Result<(), EngineError> {
        let _guard = self.lock();
        let current = self.state.load_full();
        let next = current.target.with_rewrites(&rules)?;

        let mut global = GlobalConfig::clone(&current.global);
        global.proxy.path_rewrite = rules;
        self.publish_proxy(&current, global, next)?;

        tracing::info!(rules = self.path_rewrite().len(), "Path rewrite rules updated");
        Ok(())
    }

    pub fn set_change_origin(&self, change_origin: bool) -> Result<(), EngineError> {
        let _guard = self.lock();
        let current = self.state.load_full();
        let next = current.target.with_change_origin(change_origin);

        let mut global = GlobalConfig::clone(&current.global);
        global.proxy.change_origin = change_origin;
        self.publish_proxy(&current, global, next)?;

        tracing::info!(change_origin, "Change-origin updated");
        Ok(())
    }

    fn publish_proxy(&self, current: &EngineState, global: GlobalConfig, target: UpstreamTarget) -> Result<(), EngineError> {
        self.store.save_global(&global)?;
        self.publish(current.with_proxy(global, target));
        Ok(())
    }

    /// Re-read the whole configuration and replace Route Table and target.
    ///
    /// An unreadable or invalid configuration keeps the current state.
    pub fn reload(&self) -> Result<(), EngineError> {
        let _guard = self.lock();
        let snapshot = self.store.load().map_err(EngineError::Load)?;
        let target = UpstreamTarget::from_settings(&snapshot.global.proxy)?;
        let routes = RouteTable::new(snapshot.features);

        if snapshot.global.server.address() != self.server_address() {
            tracing::warn!(
                address = %snapshot.global.server.address(),
                "Server address changed; takes effect after restart"
            );
        }

        tracing::info!(
            features = routes.features().len(),
            endpoints = routes.endpoint_count(),
            target = %target.url(),
            "Configuration reloaded"
        );

        self.publish(EngineState::build(routes, snapshot.global, target));
        Ok(())
    }

    // ---- features and endpoints ----

    pub fn create_feature(&self, name: &str) -> Result<(), EngineError> {
        let _guard = self.lock();
        let current = self.state.load_full();
        if current.routes.feature(name).is_some() {
            return Err(EngineError::DuplicateFeature(name.to_string()));
        }

        let feature = FeatureGroup::new(name);
        validate_feature(&feature).map_err(EngineError::InvalidFeature)?;
        self.store.save_feature(&feature)?;

        let mut next = RouteTable::clone(&current.routes);
        next.upsert_feature(feature);
        self.publish(current.with_routes(next));

        tracing::info!(feature = %name, "Feature created");
        Ok(())
    }

    pub fn delete_feature(&self, name: &str) -> Result<(), EngineError> {
        let _guard = self.lock();
        let current = self.state.load_full();
        let mut next = RouteTable::clone(&current.routes);
        next.remove_feature(name)
            .ok_or_else(|| EngineError::FeatureNotFound(name.to_string()))?;

        self.store.delete_feature(name)?;
        self.publish(current.with_routes(next));

        tracing::info!(feature = %name, "Feature deleted");
        Ok(())
    }

    pub fn create_endpoint(&self, feature: &str, endpoint: Endpoint) -> Result<(), EngineError> {
        validate_endpoint(&endpoint).map_err(EngineError::InvalidEndpoint)?;
        let id = endpoint.id.clone();

        self.edit_feature(feature, |group| {
            if group.endpoint(&endpoint.id).is_some() {
                return Err(EngineError::DuplicateEndpoint {
                    feature: group.name.clone(),
                    id: endpoint.id.clone(),
                });
            }
            group.endpoints.push(endpoint);
            Ok(())
        })?;

        tracing::info!(feature = %feature, endpoint = %id, "Endpoint created");
        Ok(())
    }

    pub fn delete_endpoint(&self, feature: &str, id: &str) -> Result<(), EngineError> {
        self.edit_feature(feature, |group| {
            let index = group
                .endpoints
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| endpoint_not_found(feature, id))?;
            group.endpoints.remove(index);
            Ok(())
        })?;

        tracing::info!(feature = %feature, endpoint = %id, "Endpoint deleted");
        Ok(())
    }

    /// Flip an endpoint's `active` flag. Returns the new value.
    pub fn toggle_active(&self, feature: &str, id: &str) -> Result<bool, EngineError> {
        let active = self.edit_feature(feature, |group| {
            let endpoint = group.endpoint_mut(id).ok_or_else(|| endpoint_not_found(feature, id))?;
            endpoint.active = !endpoint.active;
            Ok(endpoint.active)
        })?;

        tracing::info!(feature = %feature, endpoint = %id, active, "Endpoint toggled");
        Ok(active)
    }

    /// Select which named response an endpoint serves.
    pub fn set_default_response(&self, feature: &str, id: &str, response: &str) -> Result<(), EngineError> {
        self.edit_feature(feature, |group| {
            let endpoint = group.endpoint_mut(id).ok_or_else(|| endpoint_not_found(feature, id))?;
            if !endpoint.responses.contains_key(response) {
                return Err(EngineError::ResponseNotFound {
                    endpoint: id.to_string(),
                    response: response.to_string(),
                });
            }
            endpoint.default_response = response.to_string();
            Ok(())
        })?;

        tracing::info!(feature = %feature, endpoint = %id, response = %response, "Default response changed");
        Ok(())
    }

    /// Copy-on-write edit of one feature group under the writer lock.
    fn edit_feature<T>(
        &self,
        name: &str,
        edit: impl FnOnce(&mut FeatureGroup) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let _guard = self.lock();
        let current = self.state.load_full();
        let mut group = current
            .routes
            .feature(name)
            .cloned()
            .ok_or_else(|| EngineError::FeatureNotFound(name.to_string()))?;

        let out = edit(&mut group)?;
        validate_feature(&group).map_err(EngineError::InvalidFeature)?;
        self.store.save_feature(&group)?;

        let mut next = RouteTable::clone(&current.routes);
        next.upsert_feature(group);
        self.publish(current.with_routes(next));
        Ok(out)
    }
}

fn endpoint_not_found(feature: &str, id: &str) -> EngineError {
    EngineError::EndpointNotFound {
        feature: feature.to_string(),
        id: id.to_string(),
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store)
            .field("target", &self.target_url())
            .field("endpoints", &self.state.load().routes.endpoint_count())
            .finish()
    }
}
