//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, panic guard,
//!   authentication, identity relay, metrics)
//! - Own the process-wide downstream client and service registry
//! - Apply registry updates from config reloads
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::aggregation::{AggregationEngine, DownstreamClient, DownstreamServices};
use crate::auth::{authenticate, relay_identity, require_authentication, JwtValidator, RejectAll, TokenValidator};
use crate::config::GatewayConfig;
use crate::discovery::{ServiceResolver, SharedRegistry, StaticRegistry};
use crate::error::KeyError;
use crate::http::handlers;
use crate::http::request::UuidRequestId;
use crate::observability::metrics;

/// Startup failures while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build downstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to load token verification key: {0}")]
    Key(#[from] KeyError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AggregationEngine>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    registry: Arc<SharedRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let validator: Arc<dyn TokenValidator> =
            if config.auth.jwt_secret.is_some() || config.auth.jwt_public_key_path.is_some() {
                Arc::new(JwtValidator::from_config(&config.auth)?)
            } else {
                tracing::warn!("No token verification key configured, bearer tokens will be rejected");
                Arc::new(RejectAll)
            };
        Self::with_validator(config, validator)
    }

    /// Create a server with an explicit token validator.
    pub fn with_validator(
        config: GatewayConfig,
        validator: Arc<dyn TokenValidator>,
    ) -> Result<Self, ServerError> {
        let registry = Arc::new(SharedRegistry::new(StaticRegistry::from_config(&config.services)));
        let client = DownstreamClient::from_config(&config.downstream)?;

        let resolver: Arc<dyn ServiceResolver> = registry.clone();
        let engine = AggregationEngine::new(
            client,
            resolver,
            DownstreamServices::from(&config.downstream),
        );
        let state = AppState {
            engine: Arc::new(engine),
        };

        let router = Self::build_router(&config, state, validator);
        Ok(Self {
            router,
            config,
            registry,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        validator: Arc<dyn TokenValidator>,
    ) -> Router {
        let summary = Router::new().route(
            "/api/aggregation/members/{id}/summary",
            get(handlers::member_summary),
        );
        let summary = if config.auth.require_authentication {
            summary.route_layer(middleware::from_fn(require_authentication))
        } else {
            summary
        };

        // Layers run outermost-last: request ID → trace → panic guard →
        // timeout → metrics → authenticate → relay → handler.
        Router::new()
            .route("/api/test", get(handlers::test))
            .route("/api/routes", get(handlers::routes))
            .route("/api/health", get(handlers::health))
            .route("/health", get(handlers::health))
            .merge(summary)
            .with_state(state)
            .layer(middleware::from_fn(relay_identity))
            .layer(middleware::from_fn_with_state(validator, authenticate))
            .layer(middleware::from_fn(track_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::new())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Registry changes from `config_updates` are applied live; other
    /// settings take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.registry.snapshot().service_count(),
            require_authentication = self.config.auth.require_authentication,
            "HTTP server starting"
        );

        let registry = self.registry.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                registry.replace(StaticRegistry::from_config(&new_config.services));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The live service registry.
    pub fn registry(&self) -> Arc<SharedRegistry> {
        self.registry.clone()
    }
}

/// Record method, status and latency for every inbound request.
async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
