//! Identity relay.
//!
//! # Responsibilities
//! - Translate a verified token into trusted `X-User-*` headers
//! - Stamp those headers on the inbound request for internal consumers
//! - Provide the same header set for outbound downstream calls
//!
//! # Design Decisions
//! - Fail open on identity: a header that cannot be built leaves the
//!   request untouched, it is never rejected here
//! - `X-User-*` headers are all or nothing on every hop; the bearer token
//!   is relayed on its own when they cannot be built
//! - Authorization is enforced by route policy, not by this filter
//! - Header names are lowercase on the wire (HTTP/2 requires it)

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::auth::identity::{build_identity_context, IdentityContext};
use crate::auth::middleware::VerifiedToken;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_USER_NAME: HeaderName = HeaderName::from_static("x-user-name");
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");
pub const X_USER_ROLES: HeaderName = HeaderName::from_static("x-user-roles");
pub const X_AUTH_SOURCE: HeaderName = HeaderName::from_static("x-auth-source");

/// Fixed value of `X-Auth-Source`.
pub const AUTH_SOURCE_GATEWAY: &str = "gateway";

/// Identity could not be expressed as headers.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("value for {header} is not a valid header value")]
    InvalidValue { header: HeaderName },
}

fn value(header: &HeaderName, raw: &str) -> Result<HeaderValue, RelayError> {
    HeaderValue::from_str(raw).map_err(|_| RelayError::InvalidValue {
        header: header.clone(),
    })
}

/// The five identity headers. Unset fields are sent as empty strings.
pub fn identity_headers(identity: &IdentityContext) -> Result<HeaderMap, RelayError> {
    let mut headers = HeaderMap::with_capacity(5);
    headers.insert(X_USER_ID, value(&X_USER_ID, &identity.user_id)?);
    headers.insert(X_USER_NAME, value(&X_USER_NAME, &identity.username)?);
    headers.insert(X_USER_EMAIL, value(&X_USER_EMAIL, &identity.email)?);
    headers.insert(X_USER_ROLES, value(&X_USER_ROLES, &identity.roles_header())?);
    headers.insert(X_AUTH_SOURCE, HeaderValue::from_static(AUTH_SOURCE_GATEWAY));
    Ok(headers)
}

/// `Bearer <token>` for the identity, `None` when there is no token.
pub fn bearer_value(identity: &IdentityContext) -> Result<Option<HeaderValue>, RelayError> {
    if !identity.has_token() {
        return Ok(None);
    }
    let bearer = format!("Bearer {}", identity.raw_token);
    value(&AUTHORIZATION, &bearer).map(Some)
}

/// Identity headers plus `Authorization: Bearer` when a token is present.
pub fn outbound_headers(identity: &IdentityContext) -> Result<HeaderMap, RelayError> {
    let mut headers = identity_headers(identity)?;
    if let Some(bearer) = bearer_value(identity)? {
        headers.insert(AUTHORIZATION, bearer);
    }
    Ok(headers)
}

/// Return the request with identity headers set, replacing any values the
/// client supplied. If the headers cannot be built the request is returned
/// unchanged.
pub fn stamp_headers<B>(request: Request<B>, identity: &IdentityContext) -> Request<B> {
    let headers = match identity_headers(identity) {
        Ok(headers) => headers,
        Err(e) => {
            tracing::warn!(error = %e, "Could not relay identity, forwarding request without identity headers");
            return request;
        }
    };

    let (mut parts, body) = request.into_parts();
    for (name, value) in headers {
        if let Some(name) = name {
            parts.headers.insert(name, value);
        }
    }
    Request::from_parts(parts, body)
}

/// Global relay middleware.
///
/// Requests carrying a [`VerifiedToken`] get identity headers and an
/// [`IdentityContext`] extension; anonymous requests pass through unmodified.
///
/// The extension is attached even when stamping fails. Downstream calls then
/// carry the bearer token without `X-User-*` headers, and the caller is never
/// swapped for the system identity.
pub async fn relay_identity(request: Request<Body>, next: Next) -> Response {
    let identity = request
        .extensions()
        .get::<VerifiedToken>()
        .map(|verified| build_identity_context(Some(&verified.claims), &verified.token));

    let request = match identity {
        Some(identity) => {
            tracing::debug!(user_id = %identity.user_id, roles = %identity.roles_header(), "Relaying identity");
            let mut request = stamp_headers(request, &identity);
            request.extensions_mut().insert(identity);
            request
        }
        None => request,
    };

    next.run(request).await
}
