//! Raw cycle counter and monotonic clock access for test-rdtsc.
//!
//! The instruction sequences live in one per-architecture module; everything
//! else goes through [`TscCounter`] and [`SystemMonotonicClock`], or through
//! the mocks in [`mock`] when the readings have to be deterministic.
#[cfg(target_arch = "x86_64")]
mod x86_64;
#[cfg(target_arch = "x86_64")]
use x86_64 as raw;

#[cfg(not(target_arch = "x86_64"))]
mod fallback;
#[cfg(not(target_arch = "x86_64"))]
use fallback as raw;

pub mod mock;
mod monotonic;

use std::fmt::{Display, Formatter};
pub use monotonic::SystemMonotonicClock;
use tsc_traits::CounterReader;

/// How the cycle counter is sampled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CounterMode {
    /// CPUID barrier followed by RDTSC.
    #[default]
    Serializing,
    /// RDTSCP, ordered against later instructions, no barrier.
    Fast,
}

impl Display for CounterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterMode::Serializing => write!(f, "rdtsc"),
            CounterMode::Fast => write!(f, "rdtscp"),
        }
    }
}

/// The hardware time-stamp counter.
#[derive(Copy, Clone, Debug, Default)]
pub struct TscCounter {
    mode: CounterMode,
}

impl TscCounter {
    pub fn new(mode: CounterMode) -> Self {
        TscCounter { mode }
    }

    pub fn mode(&self) -> CounterMode {
        self.mode
    }
}

impl CounterReader for TscCounter {
    #[inline(always)]
    fn read_cycles(&mut self) -> u64 {
        match self.mode {
            CounterMode::Serializing => raw::read_serialized(),
            // The processor id would tell a core migration apart from a real
            // inversion; it is not acted upon yet.
            CounterMode::Fast => {
                let (cycles, _cpu) = raw::read_ordered();
                cycles
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsc_traits::MonotonicClock;

    #[test]
    fn test_counter_advances_in_both_modes() {
        for mode in [CounterMode::Serializing, CounterMode::Fast] {
            let mut counter = TscCounter::new(mode);
            assert_eq!(counter.mode(), mode);
            let first = counter.read_cycles();
            let mut last = first;
            for _ in 0..10_000 {
                last = counter.read_cycles();
            }
            assert!(last > first, "{mode} did not advance: {first} -> {last}");
        }
    }

    #[test]
    fn test_counter_tracks_the_monotonic_clock() {
        let mut counter = TscCounter::default();
        let mut clock = SystemMonotonicClock::new();
        let c0 = counter.read_cycles();
        let t0 = clock.read_clock().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let c1 = counter.read_cycles();
        let t1 = clock.read_clock().unwrap();

        // A migration to a core whose counter is behind wraps to a huge
        // value and fails the bounds below instead of overflowing.
        let hz = c1.wrapping_sub(c0) as f64 / ((t1 - t0) as f64 / 1e9);
        // Anything from a slow fallback counter to a very fast TSC.
        assert!(hz > 1e6, "implausible counter frequency {hz}");
        assert!(hz < 1e11, "implausible counter frequency {hz}");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(CounterMode::Serializing.to_string(), "rdtsc");
        assert_eq!(CounterMode::Fast.to_string(), "rdtscp");
        assert_eq!(CounterMode::default(), CounterMode::Serializing);
    }
}
