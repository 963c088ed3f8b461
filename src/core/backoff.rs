use rand::Rng;
use std::time::Duration;

/// Bounded retry schedule for optimistic commits
///
/// Attempt `n` (1-based) that fails waits `base * 2^(n-1)`, capped at
/// `max_delay`, with up to 50% random jitter added so colliding writers
/// drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Whether another attempt is allowed after `attempt` failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay without jitter after failed attempt number `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Delay with jitter after failed attempt number `attempt`
    pub fn backoff_with_jitter<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let backoff = self.backoff(attempt);
        let jitter_ceiling = backoff.as_micros() as u64 / 2;
        if jitter_ceiling == 0 {
            return backoff;
        }
        backoff + Duration::from_micros(rng.gen_range(0..=jitter_ceiling))
    }
}
