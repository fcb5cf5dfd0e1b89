//! Inbound endpoints.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::IdentityContext;
use crate::http::request::X_REQUEST_ID;
use crate::http::server::AppState;

/// Routes served by the gateway itself, as listed by `/api/routes`.
pub const ROUTES: &[(&str, &str)] = &[
    ("GET /api/test", "Gateway self-test"),
    ("GET /api/routes", "This listing"),
    ("GET /api/health", "Liveness probe"),
    (
        "GET /api/aggregation/members/{id}/summary",
        "Member summary with enrolled classes and payments (requires authentication)",
    ),
];

pub async fn test() -> &'static str {
    "Gateway controller is working"
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn routes() -> String {
    let mut listing = String::from("Available routes:\n");
    for (route, description) in ROUTES {
        listing.push_str(&format!("- {} - {}\n", route, description));
    }
    listing
}

/// `GET /api/aggregation/members/{id}/summary`
///
/// 200 with the summary whenever the member was found, even if classes or
/// payments came back empty; 404 when the member lookup produced nothing.
pub async fn member_summary(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
    request: Request<Body>,
) -> Response {
    let (parts, _body) = request.into_parts();
    let identity = parts.extensions.get::<IdentityContext>();
    let request_id = parts.headers.get(X_REQUEST_ID);

    let summary = state
        .engine
        .member_summary(member_id, identity, request_id)
        .await;

    if summary.has_member() {
        (StatusCode::OK, Json(summary)).into_response()
    } else {
        tracing::info!(member_id, "Member not found or member service unavailable");
        StatusCode::NOT_FOUND.into_response()
    }
}
