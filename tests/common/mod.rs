//! Shared utilities for the cookie gate integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use cookie_gate::{CookieService, Exchange};

/// Cookie service double: appends a fixed Set-Cookie header and counts how
/// often the gate lets it run.
pub struct RecordingCookieService {
    calls: AtomicUsize,
    cookie: &'static str,
}

impl RecordingCookieService {
    pub fn new(cookie: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            cookie,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CookieService for RecordingCookieService {
    fn write_to_response(&self, exchange: &mut Exchange) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        exchange
            .headers_mut()
            .append(SET_COOKIE, HeaderValue::from_static(self.cookie));
    }
}
