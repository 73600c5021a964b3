//! The request/response exchange and its lifecycle.
//!
//! # Responsibilities
//! - Hold one HTTP transaction: request head, response status/headers/body
//! - Track the response lifecycle as an explicit state machine
//! - Carry the one-shot finalization hook fired right before headers go out
//!
//! # Design Decisions
//! - The exchange is a value passed through the pipeline, never ambient
//!   state, so concurrent requests cannot interfere
//! - The flush point is an explicit `Phase` transition owned by the
//!   pipeline, not an implicit callback API
//! - A second `flush()` is an error; a second `on_flush()` replaces the
//!   first hook and logs a warning

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use thiserror::Error;
use uuid::Uuid;

/// One-shot hook invoked right before response headers are sent.
type FlushHook = Box<dyn FnOnce(&mut Exchange) + Send>;

/// Lifecycle of a single exchange, as seen by the pipeline.
///
/// `FlushTriggered` is reached zero or one times: zero if the exchange is
/// dropped before any output (cancellation, handler failure), one otherwise.
/// No path reaches `HeadersSent` without passing through `FlushTriggered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Exchange built from the incoming request, not yet dispatched.
    Created,
    /// Handed to the handler chain; status may still change any number of times.
    HandlerDispatched,
    /// The flush hook is running; headers are about to become immutable.
    FlushTriggered,
    /// Headers handed off for transmission. Terminal.
    HeadersSent,
}

/// Error raised on an invalid lifecycle transition.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// `flush()` was called on an exchange that already flushed.
    #[error("response headers already sent for exchange {0}")]
    HeadersAlreadySent(Uuid),

    /// `flush()` was re-entered from inside a running flush hook.
    #[error("flush already in progress for exchange {0}")]
    FlushInProgress(Uuid),
}

/// One HTTP transaction: a request paired with its in-progress response.
///
/// The response status defaults to 200 until a handler says otherwise,
/// matching the behavior of the hosting frameworks this component sits in.
pub struct Exchange {
    id: Uuid,
    head: Parts,
    request_body: Bytes,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    phase: Phase,
    on_flush: Option<FlushHook>,
}

impl Exchange {
    /// Create an exchange from a parsed request head and its buffered body.
    pub fn new(head: Parts, request_body: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            head,
            request_body,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            phase: Phase::Created,
            on_flush: None,
        }
    }

    /// Correlation id for this exchange, also stamped on the response.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The incoming request head (method, URI, headers).
    pub fn request_head(&self) -> &Parts {
        &self.head
    }

    /// The buffered request body.
    pub fn request_body(&self) -> &Bytes {
        &self.request_body
    }

    /// Current response status. Only final once `flush()` has run.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Set the response status. Has no effect on the wire after `flush()`.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Response headers, mutable until flushed.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Replace the response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Register the finalization hook for this exchange.
    ///
    /// The hook runs at most once, when the pipeline triggers the flush
    /// point, and never after headers have been sent. Registering a second
    /// hook replaces the first: the replaced hook is dropped unrun.
    pub fn on_flush<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut Exchange) + Send + 'static,
    {
        if self.on_flush.is_some() {
            tracing::warn!(
                exchange_id = %self.id,
                "flush hook already registered, replacing it (last registration wins)"
            );
        }
        self.on_flush = Some(Box::new(hook));
    }

    /// Marks the hand-off to the handler chain.
    pub(crate) fn mark_dispatched(&mut self) {
        if self.phase == Phase::Created {
            self.phase = Phase::HandlerDispatched;
        }
    }

    /// Trigger the flush point: run the finalization hook (if any) and seal
    /// the headers.
    ///
    /// Invoked exactly once by the pipeline, after the handler chain has
    /// completed and the status is final. Calling it a second time is a
    /// lifecycle violation, as is re-entering it from inside a hook.
    pub fn flush(&mut self) -> Result<(), ExchangeError> {
        match self.phase {
            Phase::HeadersSent => return Err(ExchangeError::HeadersAlreadySent(self.id)),
            Phase::FlushTriggered => return Err(ExchangeError::FlushInProgress(self.id)),
            Phase::Created | Phase::HandlerDispatched => {}
        }
        self.phase = Phase::FlushTriggered;
        if let Some(hook) = self.on_flush.take() {
            hook(self);
        }
        self.phase = Phase::HeadersSent;
        Ok(())
    }

    /// Convert a flushed exchange into a transmittable response.
    ///
    /// Callers must `flush()` first; the pipeline does this on every
    /// success path.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.id)
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .field("status", &self.status)
            .field("phase", &self.phase)
            .field("hook_registered", &self.on_flush.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_exchange() -> Exchange {
        let (head, _) = Request::builder()
            .uri("http://localhost/test")
            .body(())
            .unwrap()
            .into_parts();
        Exchange::new(head, Bytes::new())
    }

    #[test]
    fn test_flush_runs_hook_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut exchange = test_exchange();
        exchange.on_flush(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        exchange.flush().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(exchange.phase(), Phase::HeadersSent);
    }

    #[test]
    fn test_reentrant_flush_is_rejected() {
        let reentered = Arc::new(AtomicUsize::new(0));
        let slot = reentered.clone();

        let mut exchange = test_exchange();
        exchange.on_flush(move |ex| {
            // A misbehaving hook holding &mut Exchange tries to flush again.
            match ex.flush() {
                Err(ExchangeError::FlushInProgress(_)) => {
                    slot.fetch_add(1, Ordering::SeqCst);
                }
                other => panic!("reentrant flush must fail, got {other:?}"),
            }
        });

        exchange.flush().unwrap();
        assert_eq!(reentered.load(Ordering::SeqCst), 1);
        assert_eq!(exchange.phase(), Phase::HeadersSent, "outer flush still completes");
    }

    #[test]
    fn test_second_flush_is_an_error() {
        let mut exchange = test_exchange();
        exchange.flush().unwrap();

        let err = exchange.flush().unwrap_err();
        assert!(matches!(err, ExchangeError::HeadersAlreadySent(_)));
    }

    #[test]
    fn test_last_registration_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut exchange = test_exchange();
        let c1 = first.clone();
        exchange.on_flush(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = second.clone();
        exchange.on_flush(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        exchange.flush().unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0, "replaced hook must not run");
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_exchange_never_runs_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        {
            let mut exchange = test_exchange();
            exchange.on_flush(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            // Dropped without flushing: connection aborted before output.
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hook_sees_status_at_flush_time() {
        let mut exchange = test_exchange();
        exchange.set_status(StatusCode::OK);
        let seen = Arc::new(AtomicUsize::new(0));
        let slot = seen.clone();
        exchange.on_flush(move |ex| {
            slot.store(ex.status().as_u16() as usize, Ordering::SeqCst);
        });

        // Status keeps changing after registration; the hook must observe
        // the final value.
        exchange.set_status(StatusCode::NOT_FOUND);
        exchange.set_status(StatusCode::SERVICE_UNAVAILABLE);
        exchange.flush().unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 503);
    }

    #[test]
    fn test_into_response_carries_status_headers_body() {
        let mut exchange = test_exchange();
        exchange.set_status(StatusCode::CREATED);
        exchange
            .headers_mut()
            .insert("x-test", "yes".parse().unwrap());
        exchange.set_body("hello");
        exchange.flush().unwrap();

        let response = exchange.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get("x-test").unwrap(), "yes");
    }
}
