use std::sync::OnceLock;
use std::time::Instant;

// Nanoseconds since the first read, so values stay comparable within a run.
fn elapsed_nanos() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

#[inline(always)]
pub fn read_serialized() -> u64 {
    elapsed_nanos()
}

#[inline(always)]
pub fn read_ordered() -> (u64, u32) {
    (elapsed_nanos(), 0)
}
