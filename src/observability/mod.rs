//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gate & server produce:
//!     → logging.rs (structured log events, exchange-id correlated)
//!     → metrics.rs (counters for exchanges, writes, suppressions)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; exchange id flows through all events
//! - Metrics are cheap counter increments through the `metrics` facade;
//!   exposition is left to the embedding host

pub mod logging;
pub mod metrics;
