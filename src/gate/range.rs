//! Inclusive status-code interval used to suppress cookie writes.

/// A closed interval over HTTP status codes, inclusive at both ends.
///
/// Bounds may be supplied in either order; the constructor normalizes
/// them, so `StatusRange::new(599, 500)` behaves exactly like
/// `StatusRange::new(500, 599)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    low: u16,
    high: u16,
}

impl StatusRange {
    /// The server-error band `[500, 599]`, the default suppression range.
    pub const SERVER_ERRORS: StatusRange = StatusRange {
        low: 500,
        high: 599,
    };

    /// Create a range from two bounds, in either order.
    pub fn new(a: u16, b: u16) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Inclusive-both-ends membership test.
    pub fn contains(&self, value: u16) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn low(&self) -> u16 {
        self.low
    }

    pub fn high(&self) -> u16 {
        self.high
    }
}
