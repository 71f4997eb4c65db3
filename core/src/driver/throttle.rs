//! Optional creates-per-second cap

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;

/// Token bucket shared by every submission task of one driver
///
/// A `None` limit disables throttling; only the concurrency bound applies.
pub struct SubmissionThrottle {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    creates_per_second: Option<f64>,
}

impl SubmissionThrottle {
    /// Build a throttle from an optional creates-per-second limit
    ///
    /// Non-positive limits disable throttling. Fractional limits round up
    /// to the next whole create per second.
    pub fn new(creates_per_second: Option<f64>) -> Self {
        let limiter = creates_per_second
            .filter(|rps| *rps > 0.0 && rps.is_finite())
            .and_then(|rps| NonZeroU32::new((rps.ceil() as u32).max(1)))
            .map(|burst| RateLimiter::direct(Quota::per_second(burst)));

        Self {
            limiter,
            creates_per_second,
        }
    }

    /// A throttle that never waits
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Wait for a create slot
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Whether a limit is in force
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Configured limit
    pub fn creates_per_second(&self) -> Option<f64> {
        self.creates_per_second
    }
}

impl Default for SubmissionThrottle {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl std::fmt::Debug for SubmissionThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionThrottle")
            .field("creates_per_second", &self.creates_per_second)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_limit() {
        let throttle = SubmissionThrottle::unlimited();
        assert!(!throttle.is_enabled());
        assert!(throttle.creates_per_second().is_none());
    }

    #[test]
    fn test_non_positive_limits_disable() {
        assert!(!SubmissionThrottle::new(Some(0.0)).is_enabled());
        assert!(!SubmissionThrottle::new(Some(-3.0)).is_enabled());
        assert!(!SubmissionThrottle::new(Some(f64::NAN)).is_enabled());
    }

    #[test]
    fn test_fractional_limit_enables() {
        let throttle = SubmissionThrottle::new(Some(0.5));
        assert!(throttle.is_enabled());
        assert_eq!(throttle.creates_per_second(), Some(0.5));
    }

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let throttle = SubmissionThrottle::new(Some(1.0));
        tokio::time::timeout(std::time::Duration::from_millis(100), throttle.acquire())
            .await
            .expect("first create slot should be available");
    }

    #[test]
    fn test_debug_output() {
        let debug = format!("{:?}", SubmissionThrottle::new(Some(20.0)));
        assert!(debug.contains("SubmissionThrottle"));
        assert!(debug.contains("20.0"));
    }
}
