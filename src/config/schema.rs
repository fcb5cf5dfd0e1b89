//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Downstream service names and outbound client settings.
    pub downstream: DownstreamConfig,

    /// Static service registry entries.
    pub services: Vec<ServiceInstanceConfig>,

    /// Token validation and route policy.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Outbound configuration for the aggregation fan-out.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Registry name of the member service.
    pub member_service: String,

    /// Registry name of the class service.
    pub class_service: String,

    /// Registry name of the payment service.
    pub payment_service: String,

    /// Per-call timeout in seconds. Expiry degrades that call to empty.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections kept per downstream host.
    pub pool_max_idle_per_host: usize,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            member_service: "member-microservice".to_string(),
            class_service: "class-microservice".to_string(),
            payment_service: "payment-microservice".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 2,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 16,
        }
    }
}

/// A single registered instance of a downstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceInstanceConfig {
    /// Logical service name (e.g., "member-microservice").
    pub name: String,

    /// Instance address, either "host:port" or a full http(s) URL.
    pub address: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require a valid bearer token on the summary route.
    pub require_authentication: bool,

    /// Shared secret for HS256 tokens.
    pub jwt_secret: Option<String>,

    /// Path to an RSA public key (PEM) for RS256 tokens.
    pub jwt_public_key_path: Option<String>,

    /// Expected `iss` claim, if any.
    pub issuer: Option<String>,

    /// Accepted `aud` values, if any.
    pub audience: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_authentication: true,
            jwt_secret: None,
            jwt_public_key_path: None,
            issuer: None,
            audience: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
