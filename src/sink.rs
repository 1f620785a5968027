//! Record sinks: caller-provided handlers that receive parsed body records.
//!
//! The read pipeline asks the sink for one chunk sink per input chunk, at a
//! known body-line offset, and delivers records through it. Chunk sinks from
//! different chunks may run on different worker threads when the sink
//! declares `parallel_ok`; ordering across chunks is then unspecified.
//!
//! Because chunk sinks outlive the `&self` borrow that created them,
//! implementations share state through `Arc` (see the collectors below).

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::field::FieldValue;

/// Capabilities a sink advertises to the pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct SinkFlags {
    /// Chunk sinks may run concurrently on worker threads. Without this the
    /// pipeline parses sequentially.
    pub parallel_ok: bool,
    /// Records must arrive in increasing body offset. Implies sequential
    /// delivery.
    pub append_only: bool,
}

impl SinkFlags {
    pub(crate) fn allows_parallel(&self) -> bool {
        self.parallel_ok && !self.append_only
    }
}

/// Receives the records of one chunk of a matrix body.
pub trait ChunkSink<V>: Send {
    /// Called once per body record, with 0-based indices.
    fn handle(&mut self, row: u64, col: u64, value: V) -> Result<()>;
}

/// Receives the records of one chunk of a vector body.
pub trait VectorChunkSink<V>: Send {
    /// Called once per body record, with a 0-based index.
    fn handle(&mut self, index: u64, value: V) -> Result<()>;
}

/// Caller-provided handler for matrix bodies.
pub trait MatrixSink<V>: Send + Sync {
    type Chunk: ChunkSink<V>;

    fn flags(&self) -> SinkFlags;

    /// Produce a sub-handler positioned at the given 0-based body line
    /// offset.
    fn chunk_sink(&self, body_line: u64) -> Self::Chunk;
}

/// Caller-provided handler for vector bodies.
pub trait VectorSink<V>: Send + Sync {
    type Chunk: VectorChunkSink<V>;

    fn flags(&self) -> SinkFlags;

    fn chunk_sink(&self, body_line: u64) -> Self::Chunk;
}

/// ---------- built-in collectors ----------

type CooChunks<V> = Vec<(u64, Vec<(u64, u64, V)>)>;

/// Collects coordinate records into parallel `(rows, cols, values)` vectors.
///
/// Chunk sinks buffer locally and commit under a single lock when dropped,
/// so parallel chunk handlers contend once per chunk, not once per record.
/// Duplicate coordinates pass through unchanged.
pub struct CooCollector<V> {
    shared: Arc<Mutex<CooChunks<V>>>,
}

impl<V: FieldValue> CooCollector<V> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Consume the collector, returning records merged in body order.
    pub fn into_triplets(self) -> (Vec<u64>, Vec<u64>, Vec<V>) {
        let mut chunks = take_shared(self.shared);
        chunks.sort_by_key(|(base, _)| *base);
        let total = chunks.iter().map(|(_, recs)| recs.len()).sum();
        let mut rows = Vec::with_capacity(total);
        let mut cols = Vec::with_capacity(total);
        let mut values = Vec::with_capacity(total);
        for (_, recs) in chunks {
            for (r, c, v) in recs {
                rows.push(r);
                cols.push(c);
                values.push(v);
            }
        }
        (rows, cols, values)
    }
}

impl<V: FieldValue> Default for CooCollector<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: FieldValue> MatrixSink<V> for CooCollector<V> {
    type Chunk = CooChunkSink<V>;

    fn flags(&self) -> SinkFlags {
        SinkFlags {
            parallel_ok: true,
            append_only: false,
        }
    }

    fn chunk_sink(&self, body_line: u64) -> CooChunkSink<V> {
        CooChunkSink {
            base: body_line,
            records: Vec::new(),
            shared: Arc::clone(&self.shared),
        }
    }
}

pub struct CooChunkSink<V> {
    base: u64,
    records: Vec<(u64, u64, V)>,
    shared: Arc<Mutex<CooChunks<V>>>,
}

impl<V: FieldValue> ChunkSink<V> for CooChunkSink<V> {
    fn handle(&mut self, row: u64, col: u64, value: V) -> Result<()> {
        self.records.push((row, col, value));
        Ok(())
    }
}

impl<V> Drop for CooChunkSink<V> {
    fn drop(&mut self) {
        if self.records.is_empty() {
            return;
        }
        if let Ok(mut chunks) = self.shared.lock() {
            chunks.push((self.base, std::mem::take(&mut self.records)));
        }
    }
}

/// Collects a dense array body into a column-major `Vec`.
pub struct ArrayCollector<V> {
    shared: Arc<Mutex<Vec<V>>>,
    nrows: u64,
}

impl<V: FieldValue> ArrayCollector<V> {
    /// Preallocates `nrows * ncols` default-filled slots.
    pub fn new(nrows: u64, ncols: u64) -> Result<Self> {
        let len = nrows
            .checked_mul(ncols)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                Error::invalid_argument(format!("array shape {nrows} x {ncols} overflows"))
            })?;
        Ok(Self {
            shared: Arc::new(Mutex::new(vec![V::default(); len])),
            nrows,
        })
    }

    /// Consume the collector, returning values in column-major order.
    pub fn into_values(self) -> Vec<V> {
        take_shared(self.shared)
    }
}

impl<V: FieldValue> MatrixSink<V> for ArrayCollector<V> {
    type Chunk = ArrayChunkSink<V>;

    fn flags(&self) -> SinkFlags {
        SinkFlags {
            parallel_ok: true,
            append_only: false,
        }
    }

    fn chunk_sink(&self, _body_line: u64) -> ArrayChunkSink<V> {
        ArrayChunkSink {
            records: Vec::new(),
            shared: Arc::clone(&self.shared),
            nrows: self.nrows,
        }
    }
}

pub struct ArrayChunkSink<V> {
    records: Vec<(u64, u64, V)>,
    shared: Arc<Mutex<Vec<V>>>,
    nrows: u64,
}

impl<V: FieldValue> ChunkSink<V> for ArrayChunkSink<V> {
    fn handle(&mut self, row: u64, col: u64, value: V) -> Result<()> {
        self.records.push((row, col, value));
        Ok(())
    }
}

impl<V> Drop for ArrayChunkSink<V> {
    fn drop(&mut self) {
        if self.records.is_empty() {
            return;
        }
        if let Ok(mut values) = self.shared.lock() {
            for (row, col, v) in std::mem::take(&mut self.records) {
                let idx = (col * self.nrows + row) as usize;
                if let Some(slot) = values.get_mut(idx) {
                    *slot = v;
                }
            }
        }
    }
}

/// Collects sparse vector records into `(indices, values)` vectors.
pub struct VectorCollector<V> {
    shared: Arc<Mutex<Vec<(u64, Vec<(u64, V)>)>>>,
}

impl<V: FieldValue> VectorCollector<V> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Consume the collector, returning records merged in body order.
    pub fn into_pairs(self) -> (Vec<u64>, Vec<V>) {
        let mut chunks = take_shared(self.shared);
        chunks.sort_by_key(|(base, _)| *base);
        let total = chunks.iter().map(|(_, recs)| recs.len()).sum();
        let mut indices = Vec::with_capacity(total);
        let mut values = Vec::with_capacity(total);
        for (_, recs) in chunks {
            for (i, v) in recs {
                indices.push(i);
                values.push(v);
            }
        }
        (indices, values)
    }
}

impl<V: FieldValue> Default for VectorCollector<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: FieldValue> VectorSink<V> for VectorCollector<V> {
    type Chunk = VectorChunkSinkImpl<V>;

    fn flags(&self) -> SinkFlags {
        SinkFlags {
            parallel_ok: true,
            append_only: false,
        }
    }

    fn chunk_sink(&self, body_line: u64) -> VectorChunkSinkImpl<V> {
        VectorChunkSinkImpl {
            base: body_line,
            records: Vec::new(),
            shared: Arc::clone(&self.shared),
        }
    }
}

pub struct VectorChunkSinkImpl<V> {
    base: u64,
    records: Vec<(u64, V)>,
    shared: Arc<Mutex<Vec<(u64, Vec<(u64, V)>)>>>,
}

impl<V: FieldValue> VectorChunkSink<V> for VectorChunkSinkImpl<V> {
    fn handle(&mut self, index: u64, value: V) -> Result<()> {
        self.records.push((index, value));
        Ok(())
    }
}

impl<V> Drop for VectorChunkSinkImpl<V> {
    fn drop(&mut self) {
        if self.records.is_empty() {
            return;
        }
        if let Ok(mut chunks) = self.shared.lock() {
            chunks.push((self.base, std::mem::take(&mut self.records)));
        }
    }
}

/// Take the storage out of a collector's shared handle. All chunk sinks are
/// gone by the time a collector is consumed, so the unwrap path is the
/// common one; a leaked clone degrades to a copy.
fn take_shared<T: Clone>(shared: Arc<Mutex<T>>) -> T {
    match Arc::try_unwrap(shared) {
        Ok(mutex) => mutex.into_inner().unwrap_or_else(|p| p.into_inner()),
        Err(arc) => match arc.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        },
    }
}
