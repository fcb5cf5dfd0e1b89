//! Gym API gateway library.
//!
//! Authenticates inbound requests, relays caller identity to internal
//! services as `X-User-*` headers, and aggregates member, class and payment
//! data into a single member summary.

pub mod aggregation;
pub mod auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use aggregation::{AggregationEngine, MemberSummary};
pub use auth::{build_identity_context, stamp_headers, IdentityContext};
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
