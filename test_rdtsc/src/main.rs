use std::io;
use std::process;
use test_rdtsc::execute;
use tsc_clock::{SystemMonotonicClock, TscCounter};

fn main() {
    let mut clock = SystemMonotonicClock::new();
    let code = execute(
        std::env::args_os(),
        TscCounter::new,
        &mut clock,
        &mut io::stdout().lock(),
    );
    process::exit(code);
}
