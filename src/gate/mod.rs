//! The response-finalization gate.
//!
//! # Responsibilities
//! - Register a one-shot flush hook on every exchange passing through
//! - At flush time, read the final status and let the cookie service write
//!   its pending cookies into the response headers
//! - Skip the write entirely when the status falls in the suppression range
//!
//! # Design Decisions
//! - The status is tested at flush time, not at registration time:
//!   downstream handlers may change it any number of times in between
//! - Server errors are untrustworthy moments to set client-visible state,
//!   so `[500, 599]` is suppressed by default
//! - A missing cookie service is a configuration error surfaced at
//!   registration, never at request time

use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::GateConfig;
use crate::exchange::Exchange;
use crate::observability::metrics;
use crate::pipeline::{Handler, Next, PipelineBuilder, PipelineError};

pub mod range;

pub use range::StatusRange;

/// The cookie-writing capability.
///
/// Implementations know which cookies are pending for an exchange and how
/// to serialize them; the gate only decides whether the write is allowed.
/// The call runs synchronously at the flush point and must be in-memory
/// header mutation only — blocking I/O here would stall the response.
pub trait CookieService: Send + Sync + 'static {
    /// Write all pending cookies for this exchange into its response headers.
    fn write_to_response(&self, exchange: &mut Exchange);
}

/// Error raised while installing the gate into a pipeline.
#[derive(Debug, Error)]
pub enum GateConfigError {
    /// The gate was installed without a cookie service to delegate to.
    #[error("cookie gate requires a cookie service, but none was provided")]
    MissingCookieService,
}

/// Pipeline stage that defers the cookie write to the flush point and
/// suppresses it for server-error responses.
pub struct CookieGate {
    service: Arc<dyn CookieService>,
    suppression: StatusRange,
}

impl CookieGate {
    /// Gate with the default `[500, 599]` suppression range.
    pub fn new(service: Arc<dyn CookieService>) -> Self {
        Self::with_suppression(service, StatusRange::SERVER_ERRORS)
    }

    pub fn with_suppression(service: Arc<dyn CookieService>, suppression: StatusRange) -> Self {
        Self {
            service,
            suppression,
        }
    }

    pub fn suppression(&self) -> StatusRange {
        self.suppression
    }
}

impl Handler for CookieGate {
    fn call(
        &self,
        mut exchange: Exchange,
        next: Next,
    ) -> BoxFuture<'static, Result<Exchange, PipelineError>> {
        let service = Arc::clone(&self.service);
        let suppression = self.suppression;

        // Registered before the downstream chain runs: downstream code, not
        // the gate, may be what ultimately triggers the flush.
        exchange.on_flush(move |exchange| {
            let status = exchange.status().as_u16();
            if suppression.contains(status) {
                tracing::debug!(
                    exchange_id = %exchange.id(),
                    status,
                    "status in suppression range, skipping cookie write"
                );
                metrics::record_cookie_suppressed(status);
            } else {
                service.write_to_response(exchange);
                tracing::debug!(
                    exchange_id = %exchange.id(),
                    status,
                    "pending cookies written to response"
                );
                metrics::record_cookie_write(status);
            }
        });

        // Forward unchanged; downstream errors propagate untouched.
        next.run(exchange)
    }
}

impl PipelineBuilder {
    /// Install the cookie gate as the next pipeline stage.
    ///
    /// This is the single registration surface for the gate. It must be
    /// installed ahead of every stage whose output it should gate. The
    /// cookie service usually comes out of dependency wiring and may be
    /// absent there; absence is a fatal configuration error reported here,
    /// not at request time.
    pub fn with_cookie_gate(
        self,
        service: Option<Arc<dyn CookieService>>,
        suppression: StatusRange,
    ) -> Result<Self, GateConfigError> {
        let service = service.ok_or(GateConfigError::MissingCookieService)?;
        Ok(self.stage(CookieGate::with_suppression(service, suppression)))
    }

    /// Install the cookie gate with the suppression band from a loaded
    /// configuration. Same contract as [`with_cookie_gate`], with the band
    /// taken from `[suppression]` (bounds normalized).
    ///
    /// [`with_cookie_gate`]: PipelineBuilder::with_cookie_gate
    pub fn with_cookie_gate_from_config(
        self,
        service: Option<Arc<dyn CookieService>>,
        config: &GateConfig,
    ) -> Result<Self, GateConfigError> {
        self.with_cookie_gate(service, config.suppression.as_range())
    }
}
