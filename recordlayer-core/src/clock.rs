//! Time source for the lifecycle timestamps.

use bson::DateTime;
use chrono::Utc;
use std::fmt::Debug;

/// Supplies the current time to the mutation operations and the change log.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> chrono::DateTime<Utc>;

    /// The current time at BSON (millisecond) precision.
    fn now_bson(&self) -> DateTime {
        DateTime::from_millis(self.now().timestamp_millis())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub chrono::DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> chrono::DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_truncates_to_millis() {
        let instant = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();

        assert_eq!(FixedClock(instant).now_bson().timestamp_millis(), 1_700_000_000_123);
    }
}
