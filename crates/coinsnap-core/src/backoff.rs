//! Exponential backoff with multiplicative jitter between failover attempts.

use std::time::Duration;

/// Backoff policy applied between consecutive source attempts.
///
/// The delay before the attempt following failure `n` (0-based) is
/// `min(base * factor^n * j, cap)` where `j` is sampled uniformly from
/// `[1 - jitter, 1 + jitter]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// The initial backoff duration.
    pub base: Duration,
    /// The multiplicative factor for each subsequent attempt.
    pub factor: f64,
    /// Relative jitter width, `0.0..=1.0`.
    pub jitter: f64,
    /// Upper bound for any single delay.
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            factor: 2.0,
            jitter: 0.2,
            cap: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Policy that never sleeps.
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            factor: 1.0,
            jitter: 0.0,
            cap: Duration::ZERO,
        }
    }

    /// Jittered delay for the given 0-based attempt index.
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = self.jitter.clamp(0.0, 1.0);
        let jitter_factor = 1.0 - jitter + fastrand::f64() * 2.0 * jitter;
        self.scaled(attempt, jitter_factor)
    }

    /// Smallest delay [`delay`](Self::delay) can return for `attempt`.
    pub fn min_delay(&self, attempt: u32) -> Duration {
        self.scaled(attempt, 1.0 - self.jitter.clamp(0.0, 1.0))
    }

    /// Largest delay [`delay`](Self::delay) can return for `attempt`.
    pub fn max_delay(&self, attempt: u32) -> Duration {
        self.scaled(attempt, 1.0 + self.jitter.clamp(0.0, 1.0))
    }

    fn scaled(&self, attempt: u32, jitter_factor: f64) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let seconds = self.base.as_secs_f64() * self.factor.powi(exponent) * jitter_factor;
        let capped = seconds.min(self.cap.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.base, Duration::from_millis(500));
        assert_eq!(policy.factor, 2.0);
        assert_eq!(policy.jitter, 0.2);
        assert_eq!(policy.cap, Duration::from_secs(10));
    }

    #[test]
    fn exponential_without_jitter() {
        let policy = BackoffPolicy {
            base: Duration::from_millis(100),
            factor: 2.0,
            jitter: 0.0,
            cap: Duration::from_secs(1),
        };

        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(800));
        assert_eq!(policy.delay(4), Duration::from_secs(1)); // capped
    }

    #[test]
    fn jittered_delay_stays_in_band() {
        let policy = BackoffPolicy::default();

        for _ in 0..50 {
            for attempt in 0..6 {
                let delay = policy.delay(attempt);
                assert!(delay >= policy.min_delay(attempt), "attempt={attempt}, delay={delay:?}");
                assert!(delay <= policy.max_delay(attempt), "attempt={attempt}, delay={delay:?}");
                assert!(delay <= policy.cap);
            }
        }
    }

    #[test]
    fn cap_applies_after_jitter() {
        let policy = BackoffPolicy::default();
        // 0.5 * 2^5 = 16s before jitter, always above the 10s cap
        assert_eq!(policy.min_delay(5), Duration::from_secs(10));
        assert_eq!(policy.delay(5), Duration::from_secs(10));
    }

    #[test]
    fn none_never_sleeps() {
        let policy = BackoffPolicy::none();
        assert_eq!(policy.delay(0), Duration::ZERO);
        assert_eq!(policy.delay(7), Duration::ZERO);
    }
}
