//! Request-scoped caller identity.

use std::collections::BTreeSet;

use crate::auth::claims::Claims;

/// Role assigned to an authenticated caller whose token carries no usable roles.
pub const ROLE_MEMBER: &str = "ROLE_MEMBER";

/// Role assigned to internal calls made without a user token.
pub const ROLE_SYSTEM: &str = "ROLE_SYSTEM";

/// Normalized "who is calling", derived once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Never empty.
    pub roles: BTreeSet<String>,
    /// Bearer value to re-forward; empty when there is none.
    pub raw_token: String,
}

impl IdentityContext {
    /// Identity used for service-to-service calls that carry no user token.
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            username: "gateway".to_string(),
            email: "system@gym.internal".to_string(),
            roles: BTreeSet::from([ROLE_SYSTEM.to_string()]),
            raw_token: String::new(),
        }
    }

    /// Whether a bearer token should be forwarded downstream.
    pub fn has_token(&self) -> bool {
        !self.raw_token.is_empty()
    }

    /// Roles joined for the `X-User-Roles` header.
    pub fn roles_header(&self) -> String {
        self.roles.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }
}

/// Build an identity from verified claims.
///
/// With no claims at all the caller is treated as an internal system call.
/// With claims, missing string claims become empty strings and missing or
/// malformed roles fall back to [`ROLE_MEMBER`].
pub fn build_identity_context(claims: Option<&Claims>, raw_token: &str) -> IdentityContext {
    let Some(claims) = claims else {
        return IdentityContext::system();
    };

    let roles: BTreeSet<String> = claims
        .realm_roles()
        .map(|roles| roles.into_iter().filter(|r| !r.is_empty()).collect())
        .unwrap_or_default();
    let roles = if roles.is_empty() {
        BTreeSet::from([ROLE_MEMBER.to_string()])
    } else {
        roles
    };

    IdentityContext {
        user_id: claims.sub.clone().unwrap_or_default(),
        username: claims.preferred_username.clone().unwrap_or_default(),
        email: claims.email.clone().unwrap_or_default(),
        roles,
        raw_token: raw_token.to_string(),
    }
}
