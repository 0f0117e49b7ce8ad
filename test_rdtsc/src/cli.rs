//! Command line parsing.
//!
//! Unknown options do not stop parsing at the first one: each is reported,
//! dropped, and parsing is retried, until more than [`MAX_OPTION_ERRORS`]
//! have piled up.
use crate::config::{ProbeConfig, DEFAULT_SAMPLES};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, CommandFactory, Parser};
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use tsc_clock::CounterMode;

pub const MAX_OPTION_ERRORS: usize = 10;

pub const VERSION_TEXT: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n\n",
    "Copyright (C) 2016 Guy Shaw\n",
    "Written by Guy Shaw\n",
    "\n",
    "License GPLv3+: GNU GPL version 3 or later <http://gnu.org/licenses/gpl.html>.\n",
    "This is free software: you are free to change and redistribute it.\n",
    "There is NO WARRANTY, to the extent permitted by law.\n",
);

/// Sanity and statistical tests of the x86 time-stamp counter.
#[derive(Parser, Debug)]
#[command(name = "test-rdtsc", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Show this help message and exit
    #[allow(dead_code)]
    #[arg(short = 'h', long, short_alias = '?', action = ArgAction::Help)]
    help: Option<bool>,

    /// Show version information and exit
    #[arg(short = 'V', long)]
    version: bool,

    /// Echo extra arguments and progress on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Debug output, including the running variance of every step
    #[arg(short, long)]
    debug: bool,

    /// Test RDTSCP, instead of RDTSC
    #[arg(short = 'p', long)]
    rdtscp: bool,

    /// Show the samples
    #[arg(short = 's', long)]
    show_samples: bool,

    /// Show the statistics
    #[arg(short = 'S', long)]
    show_statistics: bool,

    /// Number of samples to take
    #[arg(value_name = "N", default_value_t = DEFAULT_SAMPLES, value_parser = parse_sample_count)]
    samples: usize,

    #[arg(hide = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    extra_args: Vec<String>,
}

fn parse_sample_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid number of samples, {s}.")),
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(ProbeConfig),
    Help(String),
    Version,
}

/// Everything that went wrong while parsing, plus the usage text to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError {
    pub diagnostics: Vec<String>,
    pub usage: String,
}

impl Display for UsageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        write!(f, "{}", self.usage)
    }
}

impl std::error::Error for UsageError {}

impl Cli {
    fn into_invocation(self) -> Invocation {
        if self.version {
            return Invocation::Version;
        }
        let debug = self.debug;
        Invocation::Run(ProbeConfig {
            samples: self.samples,
            counter_mode: if self.rdtscp {
                CounterMode::Fast
            } else {
                CounterMode::Serializing
            },
            show_samples: self.show_samples,
            show_statistics: self.show_statistics,
            verbose: self.verbose || debug,
            debug,
            extra_args: self.extra_args,
        })
    }
}

fn first_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered.lines().next().unwrap_or_default().to_string()
}

// Position in `args` of the token clap rejected, if it can be pinned down.
// A bad letter inside a cluster like `-sx` cannot, and ends the retries.
fn offending_position(err: &clap::Error, args: &[OsString]) -> Option<usize> {
    let Some(ContextValue::String(invalid)) = err.get(ContextKind::InvalidArg) else {
        return None;
    };
    args.iter().skip(1).position(|arg| {
        arg.to_str().is_some_and(|arg| {
            arg == invalid.as_str()
                || arg
                    .strip_prefix(invalid.as_str())
                    .is_some_and(|rest| rest.starts_with('='))
        })
    })
    .map(|pos| pos + 1)
}

/// Parses a full argument vector, program name first.
pub fn parse<I, T>(args: I) -> Result<Invocation, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let mut diagnostics = Vec::new();

    loop {
        if diagnostics.len() > MAX_OPTION_ERRORS {
            diagnostics.push("Too many option errors.".to_string());
            break;
        }
        match Cli::try_parse_from(&args) {
            Ok(cli) => {
                let invocation = cli.into_invocation();
                if diagnostics.is_empty() || invocation == Invocation::Version {
                    return Ok(invocation);
                }
                break;
            }
            Err(err) if err.kind() == ErrorKind::DisplayHelp => {
                return Ok(Invocation::Help(err.render().to_string()));
            }
            Err(err) if err.kind() == ErrorKind::UnknownArgument => {
                diagnostics.push(first_line(&err));
                match offending_position(&err, &args) {
                    Some(pos) => {
                        args.remove(pos);
                    }
                    None => break,
                }
            }
            Err(err) => {
                diagnostics.push(first_line(&err));
                break;
            }
        }
    }

    Err(UsageError {
        diagnostics,
        usage: Cli::command().render_help().to_string(),
    })
}
