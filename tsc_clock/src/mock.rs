//! Deterministic stand-ins for the counter and the clock.
//!
//! `MockCounter` replays a scripted sequence of cycle counts. `MockClock`
//! is a quanta mock clock that advances by a fixed step after every read,
//! and can be told to fail so the fatal paths can be exercised.
use quanta::{Clock, Instant, Mock};
use std::sync::Arc;
use std::time::Duration;
use tsc_traits::{CounterReader, MonotonicClock, Timestamp, TscError, TscResult};

#[derive(Debug, Clone)]
enum Script {
    Values(Vec<u64>),
    Stepping { start: u64, step: u64 },
}

/// A scripted cycle counter.
#[derive(Debug, Clone)]
pub struct MockCounter {
    script: Script,
    reads: usize,
}

impl MockCounter {
    /// Replays `values` in order, then keeps returning the last one.
    pub fn from_values(values: Vec<u64>) -> Self {
        MockCounter {
            script: Script::Values(values),
            reads: 0,
        }
    }

    /// Returns `start`, `start + step`, `start + 2 * step`, ...
    pub fn stepping(start: u64, step: u64) -> Self {
        MockCounter {
            script: Script::Stepping { start, step },
            reads: 0,
        }
    }

    /// Number of times the counter was read.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl CounterReader for MockCounter {
    fn read_cycles(&mut self) -> u64 {
        let index = self.reads;
        self.reads += 1;
        match &self.script {
            Script::Values(values) => values
                .get(index)
                .or(values.last())
                .copied()
                .unwrap_or_default(),
            Script::Stepping { start, step } => {
                start.wrapping_add(step.wrapping_mul(index as u64))
            }
        }
    }
}

/// A monotonic clock driven by a quanta mock.
/// Every read returns `origin + k * step` for the k-th read.
#[derive(Debug, Clone)]
pub struct MockClock {
    inner: Clock,
    mock: Arc<Mock>,
    ref_time: Instant,
    origin: Timestamp,
    step: Duration,
    resolution: Timestamp,
    fail_after: Option<usize>,
    fail_resolution: bool,
    reads: usize,
}

impl MockClock {
    pub fn new(origin: Timestamp, step: Duration) -> Self {
        let (inner, mock) = Clock::mock();
        let ref_time = inner.now();
        MockClock {
            inner,
            mock,
            ref_time,
            origin,
            step,
            resolution: Timestamp::new(0, 1),
            fail_after: None,
            fail_resolution: false,
            reads: 0,
        }
    }

    /// Resolution reported by `clock_resolution`, 1ns by default.
    pub fn with_resolution(mut self, resolution: Timestamp) -> Self {
        self.resolution = resolution;
        self
    }

    /// Makes every read after the first `reads` successful ones fail.
    pub fn failing_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }

    /// Makes the resolution query fail.
    pub fn failing_resolution(mut self) -> Self {
        self.fail_resolution = true;
        self
    }

    /// Moves the clock forward outside of the regular stepping.
    pub fn increment(&self, amount: Duration) {
        self.mock.increment(amount);
    }

    /// Number of successful reads.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl MonotonicClock for MockClock {
    fn read_clock(&mut self) -> TscResult<Timestamp> {
        if self.fail_after.is_some_and(|limit| self.reads >= limit) {
            return Err(TscError::from("clock_gettime() failed").add_cause("mock clock failure"));
        }
        let elapsed = self.inner.now() - self.ref_time;
        self.mock.increment(self.step);
        self.reads += 1;
        Ok(Timestamp::from_nanos(
            self.origin.as_nanos() + elapsed.as_nanos() as i64,
        ))
    }

    fn clock_resolution(&self) -> TscResult<Timestamp> {
        if self.fail_resolution {
            return Err(TscError::from("clock_getres() failed").add_cause("mock clock failure"));
        }
        Ok(self.resolution)
    }
}
