//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all exchange handler
//! - Wire up middleware (tracing, request timeout)
//! - Bind the server to a listener with graceful shutdown
//! - Build an `Exchange` per request and run it through the pipeline
//!
//! # Design Decisions
//! - The pipeline, not the server, owns the flush point; the server only
//!   converts the finalized exchange into a transmittable response
//! - A pipeline error yields a bare 500 with no cookies: nothing was
//!   flushed, so no finalization hook ran

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GateConfig;
use crate::exchange::Exchange;
use crate::observability::{logging, metrics};
use crate::pipeline::Pipeline;

/// Application state injected into the exchange handler.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    max_body_bytes: usize,
}

/// HTTP host for a cookie-gate pipeline.
pub struct GateServer {
    router: Router,
    config: GateConfig,
}

impl GateServer {
    /// Create a server hosting the given pipeline.
    pub fn new(config: GateConfig, pipeline: Pipeline) -> Self {
        let state = AppState {
            pipeline: Arc::new(pipeline),
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(exchange_handler))
            .route("/", any(exchange_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the listener configured in `listener.bind_address`.
    pub async fn bind(&self) -> Result<TcpListener, std::io::Error> {
        TcpListener::bind(self.config.listener.bind_address.as_str()).await
    }

    /// Composition root: initialize logging from the config, bind the
    /// configured address, and serve until a Ctrl+C signal arrives.
    ///
    /// This is the from-config entry point a host binary calls after
    /// [`load_config`](crate::config::load_config) and pipeline assembly.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        logging::init_logging(&self.config.observability.log_level);

        tracing::info!(
            bind_address = %self.config.listener.bind_address,
            suppression_low = self.config.suppression.low,
            suppression_high = self.config.suppression.high,
            request_timeout_secs = self.config.timeouts.request_secs,
            "Configuration loaded"
        );

        let listener = self.bind().await?;
        self.run(listener).await
    }

    /// Run the server until a Ctrl+C signal arrives.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until the given future resolves.
    pub async fn run_until<F>(self, listener: TcpListener, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "cookie gate server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("cookie gate server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

/// Catch-all handler: one incoming request becomes one exchange.
async fn exchange_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let exchange = Exchange::new(parts, body);
    let exchange_id = exchange.id();
    metrics::record_exchange();

    tracing::debug!(
        exchange_id = %exchange_id,
        method = %exchange.request_head().method,
        path = %exchange.request_head().uri.path(),
        "dispatching exchange"
    );

    let mut response = match state.pipeline.execute(exchange).await {
        Ok(exchange) => exchange.into_response(),
        Err(e) => {
            // Nothing was flushed, so no finalization hook ran and no
            // cookies were written.
            tracing::error!(
                exchange_id = %exchange_id,
                error = %e,
                "pipeline failed before the response was finalized"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    };

    // Success or failure, the response stays correlatable to its exchange.
    if let Ok(value) = HeaderValue::from_str(&exchange_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
