use simplelog::LevelFilter;
use tsc_clock::CounterMode;

/// Sample count used when none is given on the command line.
pub const DEFAULT_SAMPLES: usize = 20;

/// Everything a run needs to know, fixed once the arguments are parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeConfig {
    pub samples: usize,
    pub counter_mode: CounterMode,
    pub show_samples: bool,
    pub show_statistics: bool,
    pub verbose: bool,
    pub debug: bool,
    /// Positional arguments after the sample count, echoed when verbose.
    pub extra_args: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            samples: DEFAULT_SAMPLES,
            counter_mode: CounterMode::default(),
            show_samples: false,
            show_statistics: false,
            verbose: false,
            debug: false,
            extra_args: Vec::new(),
        }
    }
}

impl ProbeConfig {
    /// Phase 3 only runs when something is going to be shown.
    pub fn wants_report(&self) -> bool {
        self.show_samples || self.show_statistics
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else if self.verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Warn
        }
    }
}
