//! Wall-clock seam used when stamping sessions and situations.

use chrono::{DateTime, Utc};

/// Source of the current time. Injected so session timestamps are
/// reproducible under test.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
