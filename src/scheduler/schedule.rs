//! Jittered poll schedule
//!
//! The delay between two cycles is drawn uniformly from
//! `[max(0, base - jitter), base + jitter]`, in millisecond steps.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{SchedulerError, SchedulerResult};

/// Upper bound on either interval, keeps the millisecond arithmetic in range
const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Base interval plus symmetric jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterSchedule {
    base: Duration,
    jitter: Duration,
}

impl JitterSchedule {
    /// Create a schedule
    ///
    /// A jitter larger than the base is accepted; the lower bound clamps at 0.
    pub fn new(base: Duration, jitter: Duration) -> SchedulerResult<Self> {
        if base.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        if base > MAX_INTERVAL {
            return Err(SchedulerError::invalid_interval("base", "longer than a week"));
        }
        if jitter > MAX_INTERVAL {
            return Err(SchedulerError::invalid_interval("jitter", "longer than a week"));
        }
        Ok(Self { base, jitter })
    }

    /// Create a schedule from whole seconds
    pub fn from_secs(base_secs: u64, jitter_secs: u64) -> SchedulerResult<Self> {
        Self::new(Duration::from_secs(base_secs), Duration::from_secs(jitter_secs))
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// Smallest delay this schedule can produce
    pub fn min_delay(&self) -> Duration {
        self.base.saturating_sub(self.jitter)
    }

    /// Largest delay this schedule can produce
    pub fn max_delay(&self) -> Duration {
        self.base + self.jitter
    }

    /// Draw the delay before the next cycle
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }

        let low = self.min_delay().as_millis() as u64;
        let high = self.max_delay().as_millis() as u64;
        Duration::from_millis(rng.gen_range(low..=high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_jitter_is_exact() {
        let schedule = JitterSchedule::from_secs(60, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(schedule.next_delay(&mut rng), Duration::from_secs(60));
        }
    }

    #[test]
    fn test_bounds() {
        let schedule = JitterSchedule::from_secs(60, 10).unwrap();
        assert_eq!(schedule.min_delay(), Duration::from_secs(50));
        assert_eq!(schedule.max_delay(), Duration::from_secs(70));
    }

    #[test]
    fn test_jitter_larger_than_base_clamps() {
        let schedule = JitterSchedule::from_secs(5, 20).unwrap();
        assert_eq!(schedule.min_delay(), Duration::ZERO);
        assert_eq!(schedule.max_delay(), Duration::from_secs(25));
    }

    #[test]
    fn test_zero_base_rejected() {
        assert!(matches!(
            JitterSchedule::from_secs(0, 5),
            Err(SchedulerError::ZeroInterval)
        ));
    }

    proptest! {
        #[test]
        fn delay_stays_within_bounds(base in 1u64..3_600, jitter in 0u64..3_600, seed: u64) {
            let schedule = JitterSchedule::from_secs(base, jitter).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let delay = schedule.next_delay(&mut rng);

            prop_assert!(delay >= Duration::from_secs(base.saturating_sub(jitter)));
            prop_assert!(delay <= Duration::from_secs(base + jitter));
        }
    }
}
