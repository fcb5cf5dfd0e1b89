//! Aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! member id + IdentityContext
//!     → engine.rs (resolve services, concurrent fan-out)
//!     → client.rs (pooled HTTP GET, JSON decode, error classification)
//!     → model.rs (merge partial results into MemberSummary)
//! ```
//!
//! # Design Decisions
//! - Partial data beats a failed aggregate: every call degrades to empty
//! - The HTTP client is injected and shared; no per-request mutable state

pub mod client;
pub mod engine;
pub mod model;

pub use client::DownstreamClient;
pub use engine::{AggregationEngine, DownstreamServices};
pub use model::{
    build_summary, ClassRecord, ClassSummary, MemberRecord, MemberSummary, PaymentRecord,
    PaymentSummary,
};
