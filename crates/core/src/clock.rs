use chrono::Local;

use crate::model::Timestamp;

/// Source of "now" for server-generated stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Local wall clock, keeping the local offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now().fixed_offset()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
