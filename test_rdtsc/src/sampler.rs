use tsc_traits::{CounterReader, MonotonicClock, Timestamp, TscError, TscResult};

/// One paired reading, counter first then clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub cycles: u64,
    pub timestamp: Timestamp,
}

/// The samples of one run, in acquisition order.
/// Kept as two parallel buffers so the collection loop only does two stores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleSet {
    cycles: Vec<u64>,
    timestamps: Vec<Timestamp>,
}

fn allocate<T>(n: usize) -> TscResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(n)
        .map_err(|e| TscError::new_with_cause("Failed to allocate the sample buffers", e))?;
    Ok(buffer)
}

impl SampleSet {
    /// Takes `n` paired readings.
    /// The counter is read before the clock so the clock call falls inside the
    /// interval being measured. A clock failure aborts the whole collection.
    pub fn collect<C, K>(n: usize, counter: &mut C, clock: &mut K) -> TscResult<SampleSet>
    where
        C: CounterReader,
        K: MonotonicClock,
    {
        let mut cycles = allocate(n)?;
        let mut timestamps = allocate(n)?;
        for _ in 0..n {
            cycles.push(counter.read_cycles());
            timestamps.push(clock.read_clock()?);
        }
        Ok(SampleSet { cycles, timestamps })
    }

    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> SampleSet {
        let (cycles, timestamps) = samples
            .into_iter()
            .map(|s| (s.cycles, s.timestamp))
            .unzip();
        SampleSet { cycles, timestamps }
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            cycles: *self.cycles.get(index)?,
            timestamp: *self.timestamps.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.cycles
            .iter()
            .zip(&self.timestamps)
            .map(|(&cycles, &timestamp)| Sample { cycles, timestamp })
    }

    pub fn cycles(&self) -> &[u64] {
        &self.cycles
    }

    /// Cycles elapsed between sample `index - 1` and sample `index`.
    /// Wraps like the raw counter does when the counter went backwards.
    pub fn cycle_delta(&self, index: usize) -> u64 {
        self.cycles[index].wrapping_sub(self.cycles[index - 1])
    }

    /// Nanoseconds elapsed between sample `index - 1` and sample `index`.
    pub fn time_delta(&self, index: usize) -> i64 {
        self.timestamps[index] - self.timestamps[index - 1]
    }

    /// Number of adjacent pairs where the counter went backwards.
    pub fn inversions(&self) -> usize {
        self.cycles.windows(2).filter(|w| w[1] < w[0]).count()
    }
}
