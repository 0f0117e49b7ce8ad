use core::arch::x86_64::{__cpuid, __rdtscp, _rdtsc};

/// CPUID barrier, then RDTSC.
/// Every instruction issued before the call has retired when the counter is sampled.
#[inline(always)]
pub fn read_serialized() -> u64 {
    // SAFETY: CPUID leaf 0 and RDTSC are side-effect-free on x86_64.
    unsafe {
        let _ = __cpuid(0);
        _rdtsc()
    }
}

/// RDTSCP, returning the counter and the IA32_TSC_AUX processor id.
#[inline(always)]
pub fn read_ordered() -> (u64, u32) {
    let mut aux: u32 = 0;
    // SAFETY: RDTSCP only writes the counter and the aux register.
    let cycles = unsafe { __rdtscp(&mut aux) };
    (cycles, aux)
}
