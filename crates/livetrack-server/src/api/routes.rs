//! REST API routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use livetrack_core::{RegistryError, SchemaError};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::auth::{self, ProducerToken};
use crate::api::{metrics, ws};
use crate::config::Config;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let producer_token = ProducerToken(config.producer_token.clone().map(Arc::new));

    // Read side (no auth required)
    let public_routes = Router::new()
        .route("/v1/pilots", get(list_pilots))
        .route("/v1/schema", get(get_schema))
        .route("/metrics", get(metrics::scrape))
        // WebSocket streaming
        .route("/v1/stream", get(ws::ws_handler));

    // Write side (producer token when configured)
    let producer_routes = Router::new()
        .route(
            "/v1/pilots",
            put(set_pilots).post(upsert_pilot).delete(clear_pilots),
        )
        .layer(middleware::from_fn_with_state(producer_token, auth::require_producer));

    public_routes.merge(producer_routes)
}

// === Request/Response types ===

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub version: livetrack_core::SchemaVersion,
}

// === Handlers ===

async fn list_pilots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry().get())
}

async fn get_schema(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SchemaResponse {
        version: state.registry().schema(),
    })
}

async fn set_pilots(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> impl IntoResponse {
    let records = match payload {
        Ok(Json(records)) => records,
        Err(rejection) => return bad_body(rejection, "Send a JSON array of pilot records"),
    };
    match state.registry().set_json(records) {
        Ok(count) => {
            tracing::info!("Pilot list replaced ({} pilots)", count);
            (StatusCode::OK, Json(json!({ "count": count })))
        }
        Err(err) => rejected(&state, err),
    }
}

async fn upsert_pilot(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => return bad_body(rejection, "Send one pilot record as a JSON object"),
    };
    match state.registry().upsert_json(record) {
        Ok(pilot) => {
            tracing::info!("Pilot {} upserted", pilot.name());
            (StatusCode::OK, Json(json!(pilot)))
        }
        Err(err) => rejected(&state, err),
    }
}

async fn clear_pilots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.registry().clear();
    tracing::info!("Pilot list cleared");
    StatusCode::NO_CONTENT
}

fn bad_body(rejection: JsonRejection, hint: &str) -> (StatusCode, Json<Value>) {
    tracing::debug!("Unreadable request body: {}", rejection);
    (
        rejection.status(),
        Json(json!({
            "error": rejection.body_text(),
            "hint": hint,
        })),
    )
}

fn rejected(state: &AppState, err: RegistryError) -> (StatusCode, Json<Value>) {
    let RegistryError::Rejected { index, source } = &err;
    let hint = match source {
        SchemaError::ShapeMismatch { expected, .. } => {
            format!("This server admits {} pilot records only", expected)
        }
        SchemaError::MixedShape { .. } => {
            "A record must carry either v1 statistics or a v2 track, not both".to_string()
        }
        _ => format!("Send {} pilot records", state.registry().schema()),
    };

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": source.to_string(),
            "index": index,
            "hint": hint,
        })),
    )
}
