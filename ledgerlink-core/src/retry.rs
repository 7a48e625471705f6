//! Backoff policy for the initial load.

use std::time::Duration;

/// How long to wait between failed load rounds, and when to stop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Growth factor per failed attempt; values below 1.0 are treated as 1.0
    pub multiplier: f64,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
    /// Upper bound on one round (both fetches); `None` leaves it to the HTTP client
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::capped_exponential(Duration::from_secs(5), Duration::from_secs(60), 8)
            .with_attempt_timeout(Duration::from_secs(15))
    }
}

pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

impl RetryPolicy {
    /// Same interval every time, never gives up.
    pub fn constant(interval: Duration) -> Self {
        Self {
            initial_backoff: interval,
            max_backoff: interval,
            multiplier: 1.0,
            max_attempts: None,
            attempt_timeout: None,
        }
    }

    pub fn capped_exponential(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial_backoff: initial,
            max_backoff: max.max(initial),
            multiplier: 2.0,
            max_attempts: Some(max_attempts.max(1)),
            attempt_timeout: None,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Whether the policy ever reaches a terminal failure.
    pub fn is_bounded(&self) -> bool {
        self.max_attempts.is_some()
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64();
        if base == 0.0 {
            return Duration::ZERO;
        }
        let cap = self.max_backoff.as_secs_f64();
        let factor = self.multiplier.max(1.0);
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = base * factor.powi(exp);
        let secs = if scaled.is_finite() { scaled.min(cap) } else { cap };
        Duration::from_secs_f64(secs)
    }

    pub fn decide(&self, attempt: u32) -> RetryDecision {
        match self.max_attempts {
            Some(max) if attempt >= max => RetryDecision::GiveUp,
            _ => RetryDecision::RetryAfter(self.backoff(attempt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_never_gives_up() {
        let p = RetryPolicy::constant(Duration::from_secs(5));
        for attempt in [1, 2, 50, 10_000] {
            match p.decide(attempt) {
                RetryDecision::RetryAfter(d) => assert_eq!(d, Duration::from_secs(5)),
                RetryDecision::GiveUp => panic!("constant policy gave up at {attempt}"),
            }
        }
        assert!(!p.is_bounded());
    }

    #[test]
    fn test_exponential_is_capped() {
        let p = RetryPolicy::capped_exponential(Duration::from_secs(1), Duration::from_secs(10), 6);
        assert_eq!(p.backoff(1), Duration::from_secs(1));
        assert_eq!(p.backoff(2), Duration::from_secs(2));
        assert_eq!(p.backoff(4), Duration::from_secs(8));
        assert_eq!(p.backoff(5), Duration::from_secs(10));
        assert_eq!(p.backoff(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_bounded_gives_up_at_max() {
        let p = RetryPolicy::capped_exponential(Duration::from_secs(1), Duration::from_secs(10), 3);
        assert!(matches!(p.decide(2), RetryDecision::RetryAfter(_)));
        assert!(matches!(p.decide(3), RetryDecision::GiveUp));
    }

    #[test]
    fn test_default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.initial_backoff, Duration::from_secs(5));
        assert_eq!(p.max_attempts, Some(8));
        assert_eq!(p.attempt_timeout, Some(Duration::from_secs(15)));
    }
}
