use nix::time::{clock_getres, clock_gettime, ClockId};
use tsc_traits::{MonotonicClock, Timestamp, TscError, TscResult};

/// `CLOCK_MONOTONIC` as seen through `clock_gettime(2)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemMonotonicClock;

impl SystemMonotonicClock {
    pub fn new() -> Self {
        SystemMonotonicClock
    }
}

impl MonotonicClock for SystemMonotonicClock {
    #[inline]
    fn read_clock(&mut self) -> TscResult<Timestamp> {
        clock_gettime(ClockId::CLOCK_MONOTONIC)
            .map(|ts| Timestamp::new(ts.tv_sec() as i64, ts.tv_nsec() as i64))
            .map_err(|e| TscError::new_with_cause("clock_gettime() failed", e))
    }

    fn clock_resolution(&self) -> TscResult<Timestamp> {
        clock_getres(ClockId::CLOCK_MONOTONIC)
            .map(|ts| Timestamp::new(ts.tv_sec() as i64, ts.tv_nsec() as i64))
            .map_err(|e| TscError::new_with_cause("clock_getres() failed", e))
    }
}
