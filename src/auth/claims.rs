//! Typed view over a verified token's claims.
//!
//! Identity providers disagree about claim shapes (numeric subjects, missing
//! realm sections), so string claims are read leniently and the nested
//! `realm_access.roles` list is only interpreted through [`Claims::realm_roles`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Claims the gateway cares about. Unknown claims are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub preferred_username: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,

    /// Raw `realm_access` claim. Kept untyped so a malformed section never
    /// rejects the whole token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<Value>,
}

#[derive(Deserialize)]
struct RealmAccess {
    roles: Vec<String>,
}

impl Claims {
    /// Roles from `realm_access.roles`.
    ///
    /// Returns `None` when the section is missing, is not a map, has no
    /// `roles` key, or `roles` is not a list of strings.
    pub fn realm_roles(&self) -> Option<Vec<String>> {
        let section = self.realm_access.as_ref()?;
        match serde_json::from_value::<RealmAccess>(section.clone()) {
            Ok(access) => Some(access.roles),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed realm_access claim");
                None
            }
        }
    }
}

/// Accept strings as-is and render numbers/bools as text; anything else is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_reads_standard_claims() {
        let c = claims(json!({
            "sub": "42",
            "preferred_username": "ana",
            "email": "ana@gym.example",
            "realm_access": { "roles": ["member", "coach"] },
            "exp": 1_900_000_000u64,
        }));
        assert_eq!(c.sub.as_deref(), Some("42"));
        assert_eq!(c.preferred_username.as_deref(), Some("ana"));
        assert_eq!(c.email.as_deref(), Some("ana@gym.example"));
        assert_eq!(c.realm_roles(), Some(vec!["member".to_string(), "coach".to_string()]));
    }

    #[test]
    fn test_numeric_subject_is_rendered_as_text() {
        let c = claims(json!({ "sub": 42, "email": null }));
        assert_eq!(c.sub.as_deref(), Some("42"));
        assert_eq!(c.email, None);
    }

    #[test]
    fn test_malformed_realm_access_yields_none() {
        assert_eq!(claims(json!({})).realm_roles(), None);
        assert_eq!(claims(json!({ "realm_access": "admin" })).realm_roles(), None);
        assert_eq!(claims(json!({ "realm_access": {} })).realm_roles(), None);
        assert_eq!(
            claims(json!({ "realm_access": { "roles": "admin" } })).realm_roles(),
            None
        );
        assert_eq!(
            claims(json!({ "realm_access": { "roles": [1, 2] } })).realm_roles(),
            None
        );
    }

    #[test]
    fn test_object_subject_is_absent_not_an_error() {
        let c = claims(json!({ "sub": { "nested": true }, "preferred_username": "ana" }));
        assert_eq!(c.sub, None);
        assert_eq!(c.preferred_username.as_deref(), Some("ana"));
    }
}
