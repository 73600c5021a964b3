//! HTTP hosting surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → Exchange built from the buffered request
//!     → Pipeline::execute (stages, endpoint, flush point)
//!     → Exchange converted to the outgoing response
//! ```

pub mod server;

pub use server::GateServer;
