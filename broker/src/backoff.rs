//! Bounded exponential backoff for broker transport errors (spec §7:
//! "the worker retries with bounded backoff (e.g. capped exponential,
//! 1 s → 30 s) and continues to attempt broker contact indefinitely").

use std::time::Duration;

/// A capped exponential backoff sequence, doubling from `floor` up to `cap`.
#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    cap: Duration,
    current: Duration,
}

impl Backoff {
    /// Build a backoff starting at `floor` and never exceeding `cap`.
    pub fn new(floor: Duration, cap: Duration) -> Self {
        Backoff {
            floor,
            cap,
            current: floor,
        }
    }

    /// The default policy named in spec §7: 1 s floor, 30 s cap.
    pub fn default_broker_policy() -> Self {
        Backoff::new(Duration::from_secs(1), Duration::from_secs(30))
    }

    /// The delay to wait before the next retry, then doubles it for the
    /// following call (saturating at `cap`).
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.cap);
        delay
    }

    /// Reset back to the floor, e.g. after a successful broker call.
    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_and_caps() {
        let mut b = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(2));
        assert_eq!(b.next_delay(), Duration::from_secs(4));
        assert_eq!(b.next_delay(), Duration::from_secs(8));
        assert_eq!(b.next_delay(), Duration::from_secs(16));
        assert_eq!(b.next_delay(), Duration::from_secs(30));
        assert_eq!(b.next_delay(), Duration::from_secs(30));
    }

    #[test]
    fn reset_returns_to_floor() {
        let mut b = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));
        b.next_delay();
        b.next_delay();
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }
}
