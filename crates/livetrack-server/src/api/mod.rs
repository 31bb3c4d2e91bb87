//! API routes for the livetrack server.

pub mod auth;
pub mod metrics;
pub mod request_id;
mod routes;
pub mod ws;

use crate::config::Config;
use axum::Router;

pub fn routes(config: &Config) -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router(config)
}
