//! Authentication and identity relay subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → middleware.rs (validate via TokenValidator, attach VerifiedToken)
//!     → relay.rs (build IdentityContext, stamp X-User-* headers)
//!     → handlers / aggregation engine (reuse IdentityContext downstream)
//! ```
//!
//! # Design Decisions
//! - Token verification is a pluggable capability (validator.rs)
//! - Claims are read through a typed view (claims.rs)
//! - Identity relay fails open; route policy fails closed

pub mod claims;
pub mod identity;
pub mod middleware;
pub mod relay;
pub mod validator;

pub use claims::Claims;
pub use identity::{build_identity_context, IdentityContext, ROLE_MEMBER, ROLE_SYSTEM};
pub use middleware::{authenticate, require_authentication, VerifiedToken};
pub use relay::{bearer_value, identity_headers, outbound_headers, relay_identity, stamp_headers, RelayError};
pub use validator::{JwtValidator, RejectAll, TokenValidator};
