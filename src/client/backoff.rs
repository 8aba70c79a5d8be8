// Exponential reconnect backoff with jitter

use rand::Rng;
use std::time::Duration;

/// delay = min(cap, base * 2^attempt) + jitter. The attempt counter resets
/// only on a successful connection.
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        debug_assert!(base <= cap);
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    /// Deterministic component of the next delay, before jitter.
    pub fn base_delay(&self) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(self.attempt))
            .min(self.cap)
    }

    /// Next delay, advancing the attempt counter. Jitter is uniform over
    /// one base unit so simultaneous reconnects spread out.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.base_delay();
        self.attempt = self.attempt.saturating_add(1);
        let jitter_ms = rand::rng().random_range(0..=self.base.as_millis() as u64);
        delay + Duration::from_millis(jitter_ms)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
