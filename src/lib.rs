//! Deferred, conditional cookie finalization for HTTP response pipelines.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────────────────────────────────┐
//!                  │                  COOKIE GATE HOST                 │
//!                  │                                                   │
//!   Request        │  ┌────────┐   ┌──────────┐   ┌────────────────┐  │
//!   ───────────────┼─▶│  http  │──▶│ pipeline │──▶│ gate (register │  │
//!                  │  │ server │   │  stages  │   │  flush hook)   │  │
//!                  │  └────────┘   └──────────┘   └───────┬────────┘  │
//!                  │                                      │           │
//!                  │                                      ▼           │
//!                  │                            downstream handlers   │
//!                  │                            (status may change)   │
//!                  │                                      │           │
//!   Response       │  ┌─────────────────────┐             ▼           │
//!   ◀──────────────┼──│ flush point: hook   │◀── handler chain done   │
//!                  │  │ runs once, cookies  │                         │
//!                  │  │ written unless 5xx  │                         │
//!                  │  └─────────────────────┘                         │
//!                  │                                                   │
//!                  │  cross-cutting: config, observability             │
//!                  └───────────────────────────────────────────────────┘
//! ```
//!
//! The gate registers a one-shot hook on each exchange before the
//! downstream handler chain runs. The pipeline triggers that hook exactly
//! once, right before response headers become immutable, and the hook
//! invokes the cookie-writing capability unless the final status falls in
//! the suppression range (`[500, 599]` by default). Cookie contents and
//! serialization live entirely behind the [`CookieService`] trait.

// Core
pub mod exchange;
pub mod gate;
pub mod pipeline;

// Hosting
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::{load_config, ConfigError, GateConfig};
pub use exchange::{Exchange, ExchangeError, Phase};
pub use gate::{CookieGate, CookieService, GateConfigError, StatusRange};
pub use http::GateServer;
pub use pipeline::{Handler, Next, Pipeline, PipelineBuilder, PipelineError};
