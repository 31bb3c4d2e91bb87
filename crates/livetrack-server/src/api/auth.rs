//! Producer authentication.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Token that producer routes expect; `None` leaves them open.
#[derive(Clone)]
pub struct ProducerToken(pub Option<Arc<String>>);

/// Middleware guarding routes that write to the registry.
///
/// Expected header format: `Authorization: Bearer <producer_token>`
pub async fn require_producer(
    State(producer_token): State<ProducerToken>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = producer_token.0.as_deref() else {
        return next.run(request).await;
    };

    match extract_bearer(request.headers()) {
        Some(token) if token == expected.as_str() => next.run(request).await,
        Some(_) => {
            tracing::warn!("Rejected producer request with invalid token");
            (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({
                    "error": "Invalid producer token",
                    "hint": "Check LIVETRACK_PRODUCER_TOKEN environment variable"
                })),
            )
                .into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Producer token required",
                "hint": "Set Authorization: Bearer <token>"
            })),
        )
            .into_response(),
    }
}

/// Extract a bearer token from the Authorization header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
