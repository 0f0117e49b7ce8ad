//! Human readable output of a run: clock resolution, sample table and summary.
use crate::sampler::SampleSet;
use crate::stats::{ScaledFrequency, Statistics, WARM_UP};
use std::io::{self, Write};
use tsc_traits::Timestamp;

pub fn write_resolution<W: Write>(out: &mut W, resolution: Timestamp) -> io::Result<()> {
    writeln!(out, "Resolution of CLOCK_MONOTONIC: {resolution}")
}

/// One line per sample: index, counter as `hi:lo` words and in decimal,
/// then the cycle and nanosecond deltas to the previous sample.
pub fn write_samples<W: Write>(out: &mut W, samples: &SampleSet) -> io::Result<()> {
    for (i, sample) in samples.iter().enumerate() {
        let t = sample.cycles;
        write!(out, "{:3} {:8x}:{:08x} {:16}", i, t >> 32, t & 0xffff_ffff, t)?;
        if i > 0 {
            write!(
                out,
                " {:16} {:16}",
                samples.cycle_delta(i),
                samples.time_delta(i)
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_statistics<W: Write>(out: &mut W, statistics: Option<&Statistics>) -> io::Result<()> {
    let Some(stats) = statistics else {
        return writeln!(
            out,
            "Not enough samples for statistics (need more than {WARM_UP})."
        );
    };

    writeln!(out, "Mean TSC diff = {}", stats.mean_cycle_delta)?;
    match stats.sample_variance {
        Some(variance) => writeln!(out, "Sample variance of TSC diff = {variance}")?,
        None => writeln!(out, "Sample variance of TSC diff = undefined (one delta)")?,
    }
    match (stats.sample_variance, stats.coefficient_of_variation()) {
        (_, Some(cv)) => writeln!(out, "% coefficient of variance = {cv:.2}%")?,
        (None, None) => writeln!(out, "% coefficient of variance = undefined (one delta)")?,
        (Some(_), None) => {
            writeln!(out, "% coefficient of variance = undefined (mean TSC diff is 0)")?
        }
    }
    match stats.frequency() {
        Some(frequency) => writeln!(
            out,
            "Approx. TSC frequency = {}",
            ScaledFrequency::from(frequency)
        ),
        None => writeln!(out, "Approx. TSC frequency = undefined (no elapsed time)"),
    }
}
