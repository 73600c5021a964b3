//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::gate::StatusRange;

/// Root configuration for the cookie gate host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Status band for which cookie writes are suppressed.
    pub suppression: SuppressionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum buffered request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Suppression band configuration.
///
/// Bounds are stored as written in the config file; ordering is normalized
/// by [`StatusRange`] when the band is used, so reversed bounds are valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SuppressionConfig {
    /// One end of the inclusive suppression band.
    pub low: u16,

    /// The other end of the inclusive suppression band.
    pub high: u16,
}

impl SuppressionConfig {
    /// The normalized suppression range.
    pub fn as_range(&self) -> StatusRange {
        StatusRange::new(self.low, self.high)
    }
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            low: 500,
            high: 599,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
