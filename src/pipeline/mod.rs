//! Pipeline infrastructure: stage chaining and the flush point.
//!
//! # Data Flow
//! ```text
//! Exchange (Created)
//!     → Pipeline::execute (marks HandlerDispatched)
//!     → stage 1 → stage 2 → ... → endpoint   (each stage owns a Next handle)
//!     → Exchange::flush (FlushTriggered, hooks run once)
//!     → Exchange (HeadersSent), ready for transmission
//! ```
//!
//! # Design Decisions
//! - Stages take the exchange by value and hand it to `Next`, so there is
//!   no shared mutable state between concurrent exchanges
//! - `Pipeline::execute` is the only path from handlers to a transmitted
//!   response, and it flushes exactly once on the success path; output
//!   therefore cannot be produced without the flush event firing
//! - A handler error skips the flush entirely and propagates unchanged

use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::exchange::{Exchange, ExchangeError};

/// Boxed error type for endpoint failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error escaping the pipeline before a response was finalized.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage or the endpoint failed before any output was produced.
    #[error("handler failed before any output was produced: {0}")]
    Handler(#[source] BoxError),

    /// The exchange violated its lifecycle contract.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl PipelineError {
    /// Wrap an endpoint or stage failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        PipelineError::Handler(err.into())
    }
}

/// A pipeline stage.
///
/// A stage owns the exchange for the duration of its call. It may mutate
/// the exchange, register a flush hook, and must forward it through `next`
/// to reach the downstream stages and the endpoint.
pub trait Handler: Send + Sync + 'static {
    fn call(
        &self,
        exchange: Exchange,
        next: Next,
    ) -> BoxFuture<'static, Result<Exchange, PipelineError>>;
}

type EndpointFn =
    dyn Fn(Exchange) -> BoxFuture<'static, Result<Exchange, PipelineError>> + Send + Sync;

/// Handle to the rest of the pipeline.
///
/// Awaiting `run` is a stage's suspension point: it resolves once every
/// downstream stage and the endpoint have completed.
pub struct Next {
    stages: Arc<[Arc<dyn Handler>]>,
    index: usize,
    endpoint: Arc<EndpointFn>,
}

impl Next {
    /// Forward the exchange to the remaining stages, then the endpoint.
    pub fn run(mut self, exchange: Exchange) -> BoxFuture<'static, Result<Exchange, PipelineError>> {
        match self.stages.get(self.index).cloned() {
            Some(stage) => {
                self.index += 1;
                stage.call(exchange, self)
            }
            None => (self.endpoint)(exchange),
        }
    }
}

/// Builder for a [`Pipeline`]: stages in registration order, then one
/// terminal endpoint.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Handler>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Stages run in registration order; a stage observes
    /// (and can gate) the output of everything registered after it.
    pub fn stage<H: Handler>(mut self, handler: H) -> Self {
        self.stages.push(Arc::new(handler));
        self
    }

    /// Finish the pipeline with its terminal endpoint.
    pub fn endpoint<F, Fut>(self, endpoint: F) -> Pipeline
    where
        F: Fn(Exchange) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Exchange, PipelineError>> + Send + 'static,
    {
        let endpoint: Arc<EndpointFn> = Arc::new(move |exchange| Box::pin(endpoint(exchange)));
        Pipeline {
            stages: self.stages.into(),
            endpoint,
        }
    }
}

/// An ordered chain of stages ending in an endpoint, owning the flush point.
pub struct Pipeline {
    stages: Arc<[Arc<dyn Handler>]>,
    endpoint: Arc<EndpointFn>,
}

impl Pipeline {
    /// Process one exchange through the pipeline.
    ///
    /// On success the exchange comes back flushed (`HeadersSent`): the
    /// handler chain ran to completion, the status was final, and every
    /// registered flush hook fired exactly once before that point. On a
    /// handler error the flush never happens and the error propagates
    /// unchanged.
    pub async fn execute(&self, mut exchange: Exchange) -> Result<Exchange, PipelineError> {
        exchange.mark_dispatched();
        let next = Next {
            stages: self.stages.clone(),
            index: 0,
            endpoint: self.endpoint.clone(),
        };
        let mut exchange = next.run(exchange).await?;
        exchange.flush()?;
        Ok(exchange)
    }
}
