//! Block clock
//!
//! Time only moves when told to. Every operation reads the same timestamp
//! for its whole duration.

use chrono::Utc;
use metacollab_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

/// Monotonic block timestamp in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockClock {
    now: Timestamp,
}

impl BlockClock {
    /// Start at an explicit genesis timestamp
    pub fn new(genesis: Timestamp) -> Self {
        Self { now: genesis }
    }

    /// Start at the current wall-clock time
    pub fn starting_now() -> Self {
        Self::new(Utc::now().timestamp().max(0) as Timestamp)
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Move forward by `seconds`
    pub fn advance(&mut self, seconds: u64) -> Timestamp {
        self.now = self.now.saturating_add(seconds);
        self.now
    }

    /// Jump to an absolute timestamp that is not in the past
    pub fn warp_to(&mut self, timestamp: Timestamp) -> Result<()> {
        if timestamp < self.now {
            return Err(LedgerError::ClockBackwards {
                now: self.now,
                requested: timestamp,
            });
        }
        self.now = timestamp;
        Ok(())
    }
}

impl Default for BlockClock {
    fn default() -> Self {
        Self::starting_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = BlockClock::new(1_000);
        assert_eq!(clock.advance(21), 1_021);
        assert_eq!(clock.now(), 1_021);
    }

    #[test]
    fn test_no_backwards_warp() {
        let mut clock = BlockClock::new(1_000);
        clock.warp_to(2_000).unwrap();
        assert!(matches!(
            clock.warp_to(1_500),
            Err(LedgerError::ClockBackwards { now: 2_000, requested: 1_500 })
        ));
    }

    #[test]
    fn test_starting_now_is_recent() {
        let clock = BlockClock::starting_now();
        assert!(clock.now() > 1_600_000_000);
    }
}
