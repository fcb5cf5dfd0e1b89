//! Bearer authentication middleware.
//! Validates tokens and enforces route-level authentication.

use std::sync::Arc;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::claims::Claims;
use crate::auth::validator::TokenValidator;

/// A bearer token that passed validation, attached to request extensions.
#[derive(Clone, Debug)]
pub struct VerifiedToken {
    pub token: String,
    pub claims: Claims,
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

fn unauthorized(message: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        message,
    )
        .into_response()
}

/// Validate a bearer token if one is presented.
///
/// No token (or a non-bearer scheme) continues anonymously; a bearer token
/// that fails validation is rejected with 401.
pub async fn authenticate(
    State(validator): State<Arc<dyn TokenValidator>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    let Some(token) = token else {
        return next.run(req).await;
    };

    match validator.validate(&token) {
        Some(claims) => {
            req.extensions_mut().insert(VerifiedToken { token, claims });
            next.run(req).await
        }
        None => {
            tracing::warn!(path = %req.uri().path(), "Rejected invalid bearer token");
            unauthorized("Invalid bearer token")
        }
    }
}

/// Route policy: only requests with a verified token may continue.
pub async fn require_authentication(req: Request<Body>, next: Next) -> Response {
    if req.extensions().get::<VerifiedToken>().is_none() {
        return unauthorized("Authentication required");
    }
    next.run(req).await
}
