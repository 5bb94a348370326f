use embassy_time::Duration;
use rand::Rng;

use crate::error::{Error, Result};

/// Period plus jitter bound for the report cycle.
///
/// The jitter bound may not exceed the period: a jitter delay longer than
/// the period would let one cycle's send overlap the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicSchedule {
    period: Duration,
    jitter_bound: Duration,
}

impl PeriodicSchedule {
    pub fn new(period: Duration, jitter_bound: Duration) -> Result<Self> {
        if period == Duration::from_ticks(0) {
            return Err(Error::ZeroPeriod);
        }
        if jitter_bound > period {
            return Err(Error::JitterExceedsPeriod);
        }

        Ok(Self {
            period,
            jitter_bound,
        })
    }

    /// Jitter anywhere within the period, the classic contention-avoidance
    /// setting for many nodes sharing one medium.
    pub fn with_full_jitter(period: Duration) -> Result<Self> {
        Self::new(period, period)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn jitter_bound(&self) -> Duration {
        self.jitter_bound
    }

    /// Draw a fresh send delay, uniform over `[0, jitter_bound)` at
    /// millisecond resolution. A zero bound yields a zero delay.
    pub fn draw_jitter<R: Rng>(&self, rng: &mut R) -> Duration {
        let bound_ms = self.jitter_bound.as_millis();
        if bound_ms == 0 {
            return Duration::from_millis(0);
        }

        Duration::from_millis(rng.random_range(0..bound_ms))
    }
}
