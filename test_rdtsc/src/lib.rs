//! Sanity tests and frequency estimation for the x86 time-stamp counter.
//!
//! A run collects paired (cycle counter, `CLOCK_MONOTONIC`) samples, counts
//! the places where the counter went backwards, and optionally prints the
//! samples and a streaming estimate of the counter frequency.
#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod cli;
pub mod config;
pub mod report;
pub mod sampler;
pub mod stats;

use crate::cli::{Invocation, VERSION_TEXT};
use crate::config::ProbeConfig;
use crate::sampler::SampleSet;
use crate::stats::Statistics;
use log::{error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::ffi::OsString;
use std::io::Write;
use tsc_clock::CounterMode;
use tsc_traits::{CounterReader, MonotonicClock, TscError, TscResult};

/// The counter never went backwards.
pub const EXIT_CLEAN: i32 = 0;
/// The counter went backwards at least once.
pub const EXIT_INVERSIONS: i32 = 1;
/// Bad command line, nothing was sampled.
pub const EXIT_USAGE: i32 = 1;
/// Allocation or clock failure.
pub const EXIT_FATAL: i32 = 2;

/// What a completed run found.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub samples: usize,
    pub inversions: usize,
    /// Only computed when samples or statistics were asked for.
    pub statistics: Option<Statistics>,
}

impl RunReport {
    pub fn is_monotonic(&self) -> bool {
        self.inversions == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_monotonic() {
            EXIT_CLEAN
        } else {
            EXIT_INVERSIONS
        }
    }
}

fn output_error(e: std::io::Error) -> TscError {
    TscError::new_with_cause("Failed to write the report", e)
}

/// Collects, checks and reports one sample set.
/// Inversions are not an error: they only show up in the returned report.
pub fn run<C, K, W>(
    config: &ProbeConfig,
    counter: &mut C,
    clock: &mut K,
    out: &mut W,
) -> TscResult<RunReport>
where
    C: CounterReader,
    K: MonotonicClock,
    W: Write,
{
    info!(
        "Taking {} samples with {}.",
        config.samples, config.counter_mode
    );
    let samples = SampleSet::collect(config.samples, counter, clock)?;

    let inversions = samples.inversions();
    if inversions > 0 {
        warn!("Inversions: {inversions}");
    }

    let mut statistics = None;
    if config.wants_report() {
        let resolution = clock.clock_resolution()?;
        report::write_resolution(out, resolution).map_err(output_error)?;
        if config.show_samples {
            report::write_samples(out, &samples).map_err(output_error)?;
        }
        statistics = Statistics::from_samples(&samples);
        if config.show_statistics {
            report::write_statistics(out, statistics.as_ref()).map_err(output_error)?;
        }
        out.flush().map_err(output_error)?;
    }

    Ok(RunReport {
        samples: samples.len(),
        inversions,
        statistics,
    })
}

/// Installs the stderr text logger at the level the flags ask for.
pub fn init_logging(config: &ProbeConfig) {
    // Only the first installation in a process wins, later ones are no-ops,
    // but the level still follows the flags.
    let _ = TermLogger::init(
        config.log_level(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
    log::set_max_level(config.log_level());
}

/// Whole program behind `main`: parse, run, and map the outcome to an exit code.
/// `counter_for` builds the counter once the mode is known, so a bad command
/// line never touches it.
pub fn execute<I, T, C, K, W>(
    args: I,
    counter_for: impl FnOnce(CounterMode) -> C,
    clock: &mut K,
    out: &mut W,
) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    C: CounterReader,
    K: MonotonicClock,
    W: Write,
{
    let config = match cli::parse(args) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help(text)) => {
            return match write!(out, "{text}").and_then(|_| out.flush()) {
                Ok(()) => EXIT_CLEAN,
                Err(e) => {
                    eprintln!("{}", output_error(e));
                    EXIT_FATAL
                }
            };
        }
        Ok(Invocation::Version) => {
            return match out.write_all(VERSION_TEXT.as_bytes()).and_then(|_| out.flush()) {
                Ok(()) => EXIT_CLEAN,
                Err(e) => {
                    eprintln!("{}", output_error(e));
                    EXIT_FATAL
                }
            };
        }
        Err(usage) => {
            eprintln!("{usage}");
            return EXIT_USAGE;
        }
    };

    init_logging(&config);
    if config.verbose && !config.extra_args.is_empty() {
        info!("non-option ARGV-elements:");
        for arg in &config.extra_args {
            info!("    {arg}");
        }
    }

    let mut counter = counter_for(config.counter_mode);
    match run(&config, &mut counter, clock, out) {
        Ok(report) => report.exit_code(),
        Err(e) => {
            error!("{e}");
            EXIT_FATAL
        }
    }
}
