//! Bearer token validation capability.

use std::fs;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::auth::claims::Claims;
use crate::config::AuthConfig;

/// Capability: check a bearer token and hand back its claims.
pub trait TokenValidator: Send + Sync {
    /// Returns `None` for any token that does not verify.
    fn validate(&self, token: &str) -> Option<Claims>;
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read public key {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid key material: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("no signing key configured")]
    Missing,
}

/// Verifies JWTs signed with HS256 (shared secret) or RS256 (public key).
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn hs256(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn rs256_pem(pem: &[u8]) -> Result<Self, KeyError> {
        Ok(Self {
            decoding_key: DecodingKey::from_rsa_pem(pem)?,
            validation: Validation::new(Algorithm::RS256),
        })
    }

    /// Require this `iss` claim.
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    /// Require one of these `aud` values. An empty list disables the check.
    pub fn with_audience(mut self, audience: &[String]) -> Self {
        if audience.is_empty() {
            self.validation.validate_aud = false;
        } else {
            self.validation.set_audience(audience);
        }
        self
    }

    /// Build from the `[auth]` config section.
    pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
        let validator = match (&config.jwt_secret, &config.jwt_public_key_path) {
            (Some(secret), _) => Self::hs256(secret),
            (None, Some(path)) => {
                let pem = fs::read(path).map_err(|source| KeyError::Read {
                    path: path.clone(),
                    source,
                })?;
                Self::rs256_pem(&pem)?
            }
            (None, None) => return Err(KeyError::Missing),
        };

        let validator = match &config.issuer {
            Some(issuer) => validator.with_issuer(issuer),
            None => validator,
        };
        Ok(validator.with_audience(&config.audience))
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> Option<Claims> {
        if let Err(e) = decode_header(token) {
            tracing::debug!(error = %e, "Malformed bearer token");
            return None;
        }

        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
                None
            }
        }
    }
}

/// Rejects every token. Used when no key is configured.
#[derive(Debug, Default)]
pub struct RejectAll;

impl TokenValidator for RejectAll {
    fn validate(&self, _token: &str) -> Option<Claims> {
        None
    }
}
