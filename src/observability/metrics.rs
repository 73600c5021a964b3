//! Metrics collection.
//!
//! # Metrics
//! - `cookie_gate_exchanges_total` (counter): exchanges dispatched
//! - `cookie_gate_writes_total` (counter): cookie writes, by status
//! - `cookie_gate_suppressed_total` (counter): suppressed writes, by status

use metrics::counter;

/// Record one exchange entering the pipeline.
pub fn record_exchange() {
    counter!("cookie_gate_exchanges_total").increment(1);
}

/// Record a cookie write allowed through the gate.
pub fn record_cookie_write(status: u16) {
    counter!("cookie_gate_writes_total", "status" => status.to_string()).increment(1);
}

/// Record a cookie write suppressed by the gate.
pub fn record_cookie_suppressed(status: u16) {
    counter!("cookie_gate_suppressed_total", "status" => status.to_string()).increment(1);
}
