//! Wall-clock source.
//!
//! The query builder reads "now" through [`Clock`] so the default read window
//! can be computed against a frozen time in tests.

use std::ops::Add;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A manually driven clock.
#[derive(Debug)]
pub struct MockClock {
    now: RwLock<SystemTime>,
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl MockClock {
    pub fn with_time(time: SystemTime) -> Self {
        Self { now: RwLock::new(time) }
    }

    pub fn new() -> Self {
        Self::with_time(SystemTime::now())
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = now.add(duration);
    }

    pub fn set_time(&self, time: SystemTime) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = time;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_mock_clock_is_frozen_until_advanced() {
        let start = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let clock = MockClock::with_time(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.now(), start + Duration::from_secs(60));

        clock.set_time(start);
        assert_eq!(clock.now(), start);
    }
}
