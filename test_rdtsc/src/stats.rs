use crate::sampler::SampleSet;
use log::debug;
use std::fmt::{Display, Formatter};
use uom::si::f64::Frequency;
use uom::si::frequency::{gigahertz, hertz, kilohertz, megahertz, terahertz};

/// Deltas ending before this sample index are cache/branch warm-up noise
/// and never reach the accumulators.
pub const WARM_UP: usize = 5;

/// Streaming mean and variance (Welford).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

/// State of the accumulator right after one observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub k: u64,
    pub previous_mean: f64,
    /// Running sum of squared deviations.
    pub m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: f64) -> Step {
        self.count += 1;
        let k = self.count as f64;
        let previous_mean = self.mean;
        let delta = value - previous_mean;
        self.mean += delta / k;
        self.m2 += delta * (value - self.mean);
        Step {
            k: self.count,
            previous_mean,
            m2: self.m2,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns `(mean, sample variance)`.
    /// The variance is undefined until at least two values have been observed.
    pub fn finalize(&self) -> (f64, Option<f64>) {
        let variance = (self.count > 1).then(|| self.m2 / (self.count - 1) as f64);
        (self.mean, variance)
    }
}

/// Display unit for an estimated frequency.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrequencyUnit {
    Hertz,
    Kilohertz,
    Megahertz,
    Gigahertz,
    Terahertz,
}

impl FrequencyUnit {
    /// Largest unit whose magnitude the frequency strictly exceeds.
    pub fn select(frequency: Frequency) -> FrequencyUnit {
        let hz = frequency.get::<hertz>();
        if hz > 1e12 {
            FrequencyUnit::Terahertz
        } else if hz > 1e9 {
            FrequencyUnit::Gigahertz
        } else if hz > 1e6 {
            FrequencyUnit::Megahertz
        } else if hz > 1e3 {
            FrequencyUnit::Kilohertz
        } else {
            FrequencyUnit::Hertz
        }
    }

    pub fn magnitude(self, frequency: Frequency) -> f64 {
        match self {
            FrequencyUnit::Hertz => frequency.get::<hertz>(),
            FrequencyUnit::Kilohertz => frequency.get::<kilohertz>(),
            FrequencyUnit::Megahertz => frequency.get::<megahertz>(),
            FrequencyUnit::Gigahertz => frequency.get::<gigahertz>(),
            FrequencyUnit::Terahertz => frequency.get::<terahertz>(),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            FrequencyUnit::Hertz => "Hz",
            FrequencyUnit::Kilohertz => "KHz",
            FrequencyUnit::Megahertz => "MHz",
            FrequencyUnit::Gigahertz => "GHz",
            FrequencyUnit::Terahertz => "THz",
        }
    }
}

/// A frequency expressed in its display unit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScaledFrequency {
    pub magnitude: f64,
    pub unit: FrequencyUnit,
}

impl From<Frequency> for ScaledFrequency {
    fn from(frequency: Frequency) -> Self {
        let unit = FrequencyUnit::select(frequency);
        ScaledFrequency {
            magnitude: unit.magnitude(frequency),
            unit,
        }
    }
}

impl Display for ScaledFrequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} {}", self.magnitude, self.unit.symbol())
    }
}

/// Summary of the post warm-up deltas of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    /// Number of deltas that went into the accumulators.
    pub deltas: u64,
    pub mean_cycle_delta: f64,
    pub mean_time_delta_ns: f64,
    /// None with a single delta.
    pub sample_variance: Option<f64>,
}

impl Statistics {
    /// None when the run is too short to get past the warm-up.
    pub fn from_samples(samples: &SampleSet) -> Option<Statistics> {
        let mut cycles = RunningStats::new();
        let mut nanos = RunningStats::new();

        for i in WARM_UP.max(1)..samples.len() {
            let step = cycles.observe(samples.cycle_delta(i) as f64);
            debug!(
                "svar k={}, M={}, Q={}, svar={}",
                step.k,
                step.previous_mean,
                step.m2,
                step.m2 / step.k as f64
            );
            nanos.observe(samples.time_delta(i) as f64);
        }

        if cycles.count() == 0 {
            return None;
        }

        let (mean_cycle_delta, sample_variance) = cycles.finalize();
        Some(Statistics {
            deltas: cycles.count(),
            mean_cycle_delta,
            mean_time_delta_ns: nanos.mean(),
            sample_variance,
        })
    }

    /// Sample variance relative to the mean, in percent.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        let variance = self.sample_variance?;
        (self.mean_cycle_delta != 0.0).then(|| variance / self.mean_cycle_delta * 100.0)
    }

    /// Cycles per second, if any wall-clock time elapsed.
    pub fn frequency(&self) -> Option<Frequency> {
        (self.mean_time_delta_ns > 0.0).then(|| {
            Frequency::new::<hertz>(self.mean_cycle_delta / (self.mean_time_delta_ns / 1e9))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::Sample;
    use tsc_traits::Timestamp;

    fn hz(value: f64) -> Frequency {
        Frequency::new::<hertz>(value)
    }

    fn linear(n: usize, cycle_step: u64, nanos_step: i64) -> SampleSet {
        SampleSet::from_samples((0..n).map(|i| Sample {
            cycles: 1000 + cycle_step * i as u64,
            timestamp: Timestamp::from_nanos(nanos_step * i as i64),
        }))
    }

    #[test]
    fn test_running_stats_matches_two_pass() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stats = RunningStats::new();
        for v in values {
            stats.observe(v);
        }
        let (mean, variance) = stats.finalize();
        assert_eq!(stats.count(), 8);
        assert_relative_eq!(mean, 5.0);
        // Two-pass sample variance: 32 / 7.
        assert_relative_eq!(variance.unwrap(), 32.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_running_stats_steps() {
        let mut stats = RunningStats::new();
        let first = stats.observe(10.0);
        assert_eq!(first.k, 1);
        assert_relative_eq!(first.previous_mean, 0.0);
        assert_relative_eq!(first.m2, 0.0);
        let second = stats.observe(20.0);
        assert_eq!(second.k, 2);
        assert_relative_eq!(second.previous_mean, 10.0);
        assert_relative_eq!(second.m2, 50.0);
    }

    #[test]
    fn test_running_stats_degenerate() {
        let stats = RunningStats::new();
        assert_eq!(stats.finalize(), (0.0, None));
        let mut stats = RunningStats::new();
        stats.observe(42.0);
        assert_eq!(stats.finalize(), (42.0, None));
        stats.observe(42.0);
        assert_eq!(stats.finalize(), (42.0, Some(0.0)));
    }

    #[test]
    fn test_warm_up_boundaries() {
        assert!(Statistics::from_samples(&linear(0, 10, 10)).is_none());
        assert!(Statistics::from_samples(&linear(3, 10, 10)).is_none());
        assert!(Statistics::from_samples(&linear(5, 10, 10)).is_none());

        let stats = Statistics::from_samples(&linear(6, 10, 10)).unwrap();
        assert_eq!(stats.deltas, 1);
        assert_relative_eq!(stats.mean_cycle_delta, 10.0);
        assert_eq!(stats.sample_variance, None);
        assert_eq!(stats.coefficient_of_variation(), None);
        assert!(stats.frequency().is_some());

        for n in [7, 20, 64] {
            let stats = Statistics::from_samples(&linear(n, 10, 10)).unwrap();
            assert_eq!(stats.deltas, (n - WARM_UP) as u64);
        }
    }

    #[test]
    fn test_warm_up_deltas_are_ignored() {
        // Huge deltas inside the warm-up must not leak into the means.
        let cycles = [0u64, 1_000_000, 2_000_000, 2_000_100, 2_000_200, 2_000_300, 2_000_400, 2_000_500];
        let samples = SampleSet::from_samples(cycles.iter().enumerate().map(|(i, &c)| Sample {
            cycles: c,
            timestamp: Timestamp::from_nanos(50 * i as i64),
        }));
        let stats = Statistics::from_samples(&samples).unwrap();
        assert_eq!(stats.deltas, 3);
        assert_relative_eq!(stats.mean_cycle_delta, 100.0);
        assert_relative_eq!(stats.mean_time_delta_ns, 50.0);
        assert_relative_eq!(stats.sample_variance.unwrap(), 0.0);
        assert_relative_eq!(stats.coefficient_of_variation().unwrap(), 0.0);
        assert_relative_eq!(stats.frequency().unwrap().get::<hertz>(), 2e9);
    }

    #[test]
    fn test_variance_of_jittery_deltas() {
        // Deltas after warm-up: 90, 110, 90, 110.
        let cycles = [0u64, 100, 200, 300, 400, 490, 600, 690, 800];
        let samples = SampleSet::from_samples(cycles.iter().enumerate().map(|(i, &c)| Sample {
            cycles: c,
            timestamp: Timestamp::from_nanos(100 * i as i64),
        }));
        let stats = Statistics::from_samples(&samples).unwrap();
        assert_eq!(stats.deltas, 4);
        assert_relative_eq!(stats.mean_cycle_delta, 100.0);
        assert_relative_eq!(stats.sample_variance.unwrap(), 400.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(stats.coefficient_of_variation().unwrap(), 400.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frequency_needs_elapsed_time() {
        let stats = Statistics::from_samples(&linear(10, 10, 0)).unwrap();
        assert!(stats.frequency().is_none());
        let stats = Statistics::from_samples(&linear(10, 0, 10)).unwrap();
        assert!(stats.coefficient_of_variation().is_none());
    }

    #[test]
    fn test_one_gigahertz() {
        let stats = Statistics::from_samples(&linear(10, 1000, 1000)).unwrap();
        assert_relative_eq!(stats.mean_cycle_delta, 1000.0);
        assert_relative_eq!(stats.mean_time_delta_ns, 1000.0);
        assert_relative_eq!(stats.frequency().unwrap().get::<hertz>(), 1e9);
    }

    #[test]
    fn test_unit_selection() {
        let scaled = ScaledFrequency::from(hz(2.5e9));
        assert_eq!(scaled.unit, FrequencyUnit::Gigahertz);
        assert_relative_eq!(scaled.magnitude, 2.5, epsilon = 1e-12);
        assert_eq!(scaled.to_string(), "2.5000 GHz");

        let cases = [
            (999.0, FrequencyUnit::Hertz),
            (1e3, FrequencyUnit::Hertz),
            (1000.5, FrequencyUnit::Kilohertz),
            (1e6, FrequencyUnit::Kilohertz),
            (1_000_001.0, FrequencyUnit::Megahertz),
            (1e9, FrequencyUnit::Megahertz),
            (1_000_000_001.0, FrequencyUnit::Gigahertz),
            (1e12, FrequencyUnit::Gigahertz),
            (1_000_000_001_000.0, FrequencyUnit::Terahertz),
        ];
        for (value, unit) in cases {
            assert_eq!(FrequencyUnit::select(hz(value)), unit, "{value} Hz");
        }
    }

    #[test]
    fn test_unit_magnitudes() {
        assert_relative_eq!(FrequencyUnit::Hertz.magnitude(hz(12.0)), 12.0);
        assert_relative_eq!(FrequencyUnit::Kilohertz.magnitude(hz(12e3)), 12.0, epsilon = 1e-12);
        assert_relative_eq!(FrequencyUnit::Megahertz.magnitude(hz(1e9)), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(FrequencyUnit::Terahertz.magnitude(hz(3e12)), 3.0, epsilon = 1e-12);
        assert_eq!(FrequencyUnit::Kilohertz.symbol(), "KHz");
        assert_eq!(FrequencyUnit::Hertz.symbol(), "Hz");
    }
}
