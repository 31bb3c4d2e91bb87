//! Shared library surface for the livetrack server and its tests.

pub mod api;
pub mod config;
pub mod metrics;
pub mod state;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;

/// Full application: API routes, health check and layers.
pub fn app(state: Arc<AppState>) -> Router {
    api::routes(state.config())
        .route("/health", get(|| async { "OK" }))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::metrics::record_request,
        ))
        .with_state(state) // Inject state into all routes
        .layer(middleware::from_fn(api::request_id::ensure_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Build state and router from a configuration.
pub fn build(config: Config) -> anyhow::Result<(Router, Arc<AppState>)> {
    let state = Arc::new(AppState::new(config)?);
    Ok((app(state.clone()), state))
}
