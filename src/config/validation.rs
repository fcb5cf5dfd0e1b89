//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Keep the request timeout above the per-call downstream timeout
//! - Check the auth section names exactly one key source when required
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::discovery::parse_address;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid listener bind address '{0}'")]
    BindAddress(String),

    #[error("service entry #{0} has an empty name")]
    EmptyServiceName(usize),

    #[error("service '{name}' has invalid address '{address}'")]
    ServiceAddress { name: String, address: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.request_secs ({request_secs}) must be greater than downstream.timeout_secs ({downstream_secs})")]
    RequestTimeoutTooShort { request_secs: u64, downstream_secs: u64 },

    #[error("authentication is required but neither jwt_secret nor jwt_public_key_path is set")]
    MissingKey,

    #[error("jwt_secret and jwt_public_key_path are mutually exclusive")]
    ConflictingKeys,

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for (i, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName(i));
        }
        if parse_address(&service.address).is_none() {
            errors.push(ValidationError::ServiceAddress {
                name: service.name.clone(),
                address: service.address.clone(),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }
    if config.downstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("downstream.timeout_secs"));
    }
    if config.downstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("downstream.connect_timeout_secs"));
    }
    // A downstream call must time out on its own before the whole request does.
    if config.downstream.timeout_secs > 0
        && config.timeouts.request_secs > 0
        && config.timeouts.request_secs <= config.downstream.timeout_secs
    {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs: config.timeouts.request_secs,
            downstream_secs: config.downstream.timeout_secs,
        });
    }

    let auth = &config.auth;
    match (&auth.jwt_secret, &auth.jwt_public_key_path) {
        (Some(_), Some(_)) => errors.push(ValidationError::ConflictingKeys),
        (None, None) if auth.require_authentication => errors.push(ValidationError::MissingKey),
        _ => {}
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceInstanceConfig;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = Some("secret".into());
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.listener.bind_address = "not-an-address".into();
        config.downstream.timeout_secs = 0;
        config.services.push(ServiceInstanceConfig {
            name: "".into(),
            address: "ftp://nope".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::EmptyServiceName(0)));
        assert!(errors.contains(&ValidationError::ZeroTimeout("downstream.timeout_secs")));
    }

    #[test]
    fn test_request_timeout_must_exceed_downstream_timeout() {
        let mut config = valid();
        config.timeouts.request_secs = 1;
        config.downstream.timeout_secs = 2;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::RequestTimeoutTooShort {
                request_secs: 1,
                downstream_secs: 2,
            }]
        );

        config.timeouts.request_secs = 2;
        assert!(validate_config(&config).is_err());

        config.timeouts.request_secs = 3;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_auth_key_rules() {
        let mut config = GatewayConfig::default();
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::MissingKey]);

        config.auth.require_authentication = false;
        assert!(validate_config(&config).is_ok());

        config.auth.jwt_secret = Some("a".into());
        config.auth.jwt_public_key_path = Some("/keys/pub.pem".into());
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ConflictingKeys]
        );
    }
}
