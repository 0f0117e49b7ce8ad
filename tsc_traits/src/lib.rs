use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Sub;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Common error type for the test-rdtsc crates.
/// Any of these reaching `main` is fatal for the run.
#[derive(Debug)]
pub struct TscError {
    message: String,
    cause: Option<String>,
}

impl Display for TscError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for TscError {}

impl From<&str> for TscError {
    fn from(s: &str) -> TscError {
        TscError {
            message: s.to_string(),
            cause: None,
        }
    }
}

impl From<String> for TscError {
    fn from(s: String) -> TscError {
        TscError {
            message: s,
            cause: None,
        }
    }
}

impl TscError {
    pub fn new_with_cause(message: &str, cause: impl Error) -> TscError {
        TscError {
            message: message.to_string(),
            cause: Some(cause.to_string()),
        }
    }

    pub fn add_cause(mut self, cause: &str) -> TscError {
        self.cause = Some(cause.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// Generic Result type for test-rdtsc.
pub type TscResult<T> = Result<T, TscError>;

/// A reading of a monotonic clock, split like a `timespec`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanoseconds: i64) -> Self {
        Timestamp {
            seconds,
            nanoseconds,
        }
    }

    pub const fn from_nanos(nanos: i64) -> Self {
        Timestamp {
            seconds: nanos.div_euclid(NANOS_PER_SEC),
            nanoseconds: nanos.rem_euclid(NANOS_PER_SEC),
        }
    }

    pub const fn as_nanos(&self) -> i64 {
        self.seconds * NANOS_PER_SEC + self.nanoseconds
    }
}

/// Signed nanoseconds elapsed from `rhs` to `self`.
impl Sub for Timestamp {
    type Output = i64;

    fn sub(self, rhs: Self) -> Self::Output {
        (self.seconds - rhs.seconds) * NANOS_PER_SEC + (self.nanoseconds - rhs.nanoseconds)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s:{} nsec", self.seconds, self.nanoseconds)
    }
}

/// Source of raw cycle counts.
pub trait CounterReader {
    fn read_cycles(&mut self) -> u64;
}

/// Source of monotonic wall-clock time.
pub trait MonotonicClock {
    fn read_clock(&mut self) -> TscResult<Timestamp>;

    /// Smallest increment the clock can represent.
    fn clock_resolution(&self) -> TscResult<Timestamp>;
}
