//! Tunables for the read and write pipelines.

/// Options for reading a Matrix Market body.
#[derive(Clone, Copy, Debug)]
pub struct ReadOptions {
    /// Target chunk size in bytes. Chunks always end on a newline, so a chunk
    /// may run longer than this to finish its last line.
    pub chunk_size_bytes: usize,
    /// Worker thread count. 0 means one per hardware thread.
    pub num_threads: usize,
    /// Accepted for API compatibility; symmetry expansion is a caller
    /// post-pass and the core ignores this flag.
    pub generalize_symmetry: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            chunk_size_bytes: 1 << 20,
            num_threads: 0,
            generalize_symmetry: true,
        }
    }
}

impl ReadOptions {
    /// Resolve `num_threads == 0` to the hardware thread count.
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.num_threads
        }
    }
}

/// Options for writing a Matrix Market body.
#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    /// Target number of records per formatted output chunk.
    pub chunk_size_values: usize,
    /// Worker thread count. 0 means one per hardware thread.
    pub num_threads: usize,
    /// Decimal digits for floating-point values. `None` emits the shortest
    /// representation that round-trips to the identical bit pattern.
    pub precision: Option<usize>,
    /// Emit a single `%` line when the header comment is empty.
    pub always_comment: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            chunk_size_values: 1 << 12,
            num_threads: 0,
            precision: None,
            always_comment: false,
        }
    }
}

impl WriteOptions {
    /// Resolve `num_threads == 0` to the hardware thread count.
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.num_threads
        }
    }
}
