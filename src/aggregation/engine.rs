//! Member summary fan-out.
//!
//! # Flow (per request, single pass, no retries)
//! ```text
//! identity (or system identity)
//!     → outbound headers
//!     → join! ┬ member-service  GET /api/members/{id}        ─┐
//!             ├ class-service   GET /api/classes/member/{id} ─┼→ build_summary
//!             └ payment-service GET /api/payment/member/{id} ─┘
//! ```
//!
//! # Design Decisions
//! - Every branch converts its own failure (unresolved service, transport,
//!   status, decode, timeout) into the record's default value
//! - Branches never cancel each other; the merge waits for all three
//! - Dropping the returned future drops all outstanding calls
//! - A panic during merge yields an empty summary (`merge_or_empty`)
//! - An identity that cannot be expressed as headers still relays its bearer token

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::aggregation::client::DownstreamClient;
use crate::aggregation::model::{build_summary, ClassRecord, MemberRecord, MemberSummary, PaymentRecord};
use crate::auth::identity::IdentityContext;
use crate::auth::relay::{bearer_value, outbound_headers};
use crate::config::DownstreamConfig;
use crate::discovery::ServiceResolver;
use crate::error::DownstreamError;
use crate::observability::metrics;

/// Registry names of the three downstream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamServices {
    pub member: String,
    pub class: String,
    pub payment: String,
}

impl From<&DownstreamConfig> for DownstreamServices {
    fn from(config: &DownstreamConfig) -> Self {
        Self {
            member: config.member_service.clone(),
            class: config.class_service.clone(),
            payment: config.payment_service.clone(),
        }
    }
}

impl Default for DownstreamServices {
    fn default() -> Self {
        Self::from(&DownstreamConfig::default())
    }
}

/// Builds [`MemberSummary`] values from the member, class and payment services.
#[derive(Clone)]
pub struct AggregationEngine {
    client: DownstreamClient,
    resolver: Arc<dyn ServiceResolver>,
    services: DownstreamServices,
}

impl AggregationEngine {
    pub fn new(
        client: DownstreamClient,
        resolver: Arc<dyn ServiceResolver>,
        services: DownstreamServices,
    ) -> Self {
        Self {
            client,
            resolver,
            services,
        }
    }

    /// Aggregate everything known about `member_id`.
    ///
    /// Never fails: missing data shows up as empty fields. Without an
    /// identity the call is made as the gateway system identity.
    pub async fn member_summary(
        &self,
        member_id: i64,
        identity: Option<&IdentityContext>,
        request_id: Option<&HeaderValue>,
    ) -> MemberSummary {
        let system;
        let identity = match identity {
            Some(identity) => identity,
            None => {
                tracing::warn!(member_id, "No caller identity attached, using gateway system identity");
                system = IdentityContext::system();
                &system
            }
        };

        let mut headers = match outbound_headers(identity) {
            Ok(headers) => headers,
            Err(e) => {
                tracing::warn!(member_id, error = %e, "Calling downstream services without identity headers");
                bearer_only(identity)
            }
        };
        if let Some(request_id) = request_id {
            headers.insert("x-request-id", request_id.clone());
        }

        let start = Instant::now();
        let (member, classes, payments) = tokio::join!(
            self.fetch_or_default::<MemberRecord>(
                &self.services.member,
                format!("/api/members/{}", member_id),
                headers.clone(),
            ),
            self.fetch_or_default::<Vec<ClassRecord>>(
                &self.services.class,
                format!("/api/classes/member/{}", member_id),
                headers.clone(),
            ),
            self.fetch_or_default::<Vec<PaymentRecord>>(
                &self.services.payment,
                format!("/api/payment/member/{}", member_id),
                headers,
            ),
        );

        tracing::debug!(
            member_id,
            elapsed = ?start.elapsed(),
            classes = classes.len(),
            payments = payments.len(),
            "Downstream fan-out complete"
        );

        merge_or_empty(member_id, || build_summary(member, classes, payments))
    }

    /// One branch of the fan-out. Any failure becomes `T::default()`.
    async fn fetch_or_default<T>(&self, service: &str, path: String, headers: HeaderMap) -> T
    where
        T: DeserializeOwned + Default,
    {
        let start = Instant::now();
        let result = match self.resolver.resolve(service) {
            Some(base) => self.client.get_json::<T>(&base, &path, headers).await,
            None => Err(DownstreamError::Unresolved(service.to_string())),
        };

        match result {
            Ok(value) => {
                tracing::debug!(service, path = %path, elapsed = ?start.elapsed(), "Downstream call succeeded");
                metrics::record_downstream(service, "ok", start);
                value
            }
            Err(e) => {
                tracing::warn!(service, path = %path, error = %e, "Downstream call failed, using empty result");
                metrics::record_downstream(service, e.kind(), start);
                T::default()
            }
        }
    }
}

/// Headers for a caller whose identity cannot be expressed as headers.
fn bearer_only(identity: &IdentityContext) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match bearer_value(identity) {
        Ok(Some(bearer)) => {
            headers.insert(AUTHORIZATION, bearer);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Calling downstream services without bearer token"),
    }
    headers
}

/// Run `merge`, turning a panic into an empty summary.
fn merge_or_empty<F>(member_id: i64, merge: F) -> MemberSummary
where
    F: FnOnce() -> MemberSummary,
{
    match catch_unwind(AssertUnwindSafe(merge)) {
        Ok(summary) => summary,
        Err(_) => {
            tracing::error!(member_id, "Failed to merge member summary, returning empty summary");
            MemberSummary::default()
        }
    }
}
