//! Output formatters: generators that turn caller-owned storage into text
//! chunks.
//!
//! A formatter hands out independent chunk producers; each producer renders
//! one text chunk of fully-formed lines and may run on a worker thread. The
//! write pipeline concatenates producer output in hand-out order, so the
//! final bytes never depend on `chunk_size_values` or thread count.
//!
//! Four layouts are covered: coordinate triplets, dense vectors (index plus
//! value per line), compressed sparse column with an optional transpose for
//! CSR, and a dense 2-D accessor emitted column-major.

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::field::{write_integer, FieldValue};
use crate::options::WriteOptions;

// Buffer reservation hints, bytes per output record.
const TRIPLET_RECORD_HINT: usize = 25;
const DENSE_RECORD_HINT: usize = 15;

/// Integer types accepted as row/column indices and CSC pointers.
pub trait IndexLike: Copy + Send + Sync + 'static {
    fn as_u64(self) -> u64;

    fn as_usize(self) -> usize {
        self.as_u64() as usize
    }
}

macro_rules! impl_index_like {
    ($($t:ty),*) => {
        $(impl IndexLike for $t {
            #[inline]
            fn as_u64(self) -> u64 {
                self as u64
            }
        })*
    };
}

impl_index_like!(u32, u64, usize, i32, i64);

/// A deferred piece of formatter output. Rendering may happen on a worker
/// thread; producers are independent of each other.
pub trait ChunkProducer: Send {
    fn render(self) -> String;
}

/// Stateful generator of output chunks.
pub trait Formatter {
    type Chunk: ChunkProducer;

    fn has_next(&self) -> bool;

    /// Capture the next window of input records by reference and return its
    /// deferred producer.
    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk;
}

fn push_index(out: &mut String, zero_based: u64) {
    write_integer(out, zero_based + 1);
}

/// Formats `(rows, cols, values)` triplet slices as coordinate body lines.
///
/// An empty `values` slice omits the value column entirely, which is how
/// pattern matrices are written.
pub struct TripletFormatter<'a, I, V> {
    rows: &'a [I],
    cols: &'a [I],
    values: &'a [V],
    pos: usize,
}

impl<'a, I: IndexLike, V: FieldValue> TripletFormatter<'a, I, V> {
    pub fn new(rows: &'a [I], cols: &'a [I], values: &'a [V]) -> Result<Self> {
        if rows.len() != cols.len() || (rows.len() != values.len() && !values.is_empty()) {
            return Err(Error::invalid_argument(
                "row, column, and value ranges must have equal length",
            ));
        }
        Ok(Self {
            rows,
            cols,
            values,
            pos: 0,
        })
    }
}

impl<'a, I: IndexLike, V: FieldValue> Formatter for TripletFormatter<'a, I, V> {
    type Chunk = TripletChunk<'a, I, V>;

    fn has_next(&self) -> bool {
        self.pos < self.rows.len()
    }

    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk {
        let end = (self.pos + options.chunk_size_values.max(1)).min(self.rows.len());
        let chunk = TripletChunk {
            rows: &self.rows[self.pos..end],
            cols: &self.cols[self.pos..end],
            values: if self.values.is_empty() {
                self.values
            } else {
                &self.values[self.pos..end]
            },
            precision: options.precision,
        };
        self.pos = end;
        chunk
    }
}

pub struct TripletChunk<'a, I, V> {
    rows: &'a [I],
    cols: &'a [I],
    values: &'a [V],
    precision: Option<usize>,
}

impl<I: IndexLike, V: FieldValue> ChunkProducer for TripletChunk<'_, I, V> {
    fn render(self) -> String {
        let mut out = String::with_capacity(self.rows.len() * TRIPLET_RECORD_HINT);
        for (k, row) in self.rows.iter().enumerate() {
            push_index(&mut out, row.as_u64());
            out.push(' ');
            push_index(&mut out, self.cols[k].as_u64());
            if !self.values.is_empty() {
                out.push(' ');
                self.values[k].write_text(&mut out, self.precision);
            }
            out.push('\n');
        }
        out
    }
}

/// Formats a sparse vector as `index value` lines.
///
/// This is the explicit spelling of reusing the triplet layout for dense
/// vector output: the column slot holds the formatted value instead of an
/// index.
pub struct DenseVectorFormatter<'a, I, V> {
    indices: &'a [I],
    values: &'a [V],
    pos: usize,
}

impl<'a, I: IndexLike, V: FieldValue> DenseVectorFormatter<'a, I, V> {
    pub fn new(indices: &'a [I], values: &'a [V]) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(Error::invalid_argument(
                "index and value ranges must have equal length",
            ));
        }
        Ok(Self {
            indices,
            values,
            pos: 0,
        })
    }
}

impl<'a, I: IndexLike, V: FieldValue> Formatter for DenseVectorFormatter<'a, I, V> {
    type Chunk = DenseVectorChunk<'a, I, V>;

    fn has_next(&self) -> bool {
        self.pos < self.indices.len()
    }

    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk {
        let end = (self.pos + options.chunk_size_values.max(1)).min(self.indices.len());
        let chunk = DenseVectorChunk {
            indices: &self.indices[self.pos..end],
            values: &self.values[self.pos..end],
            precision: options.precision,
        };
        self.pos = end;
        chunk
    }
}

pub struct DenseVectorChunk<'a, I, V> {
    indices: &'a [I],
    values: &'a [V],
    precision: Option<usize>,
}

impl<I: IndexLike, V: FieldValue> ChunkProducer for DenseVectorChunk<'_, I, V> {
    fn render(self) -> String {
        let mut out = String::with_capacity(self.indices.len() * TRIPLET_RECORD_HINT);
        for (k, index) in self.indices.iter().enumerate() {
            push_index(&mut out, index.as_u64());
            out.push(' ');
            self.values[k].write_text(&mut out, self.precision);
            out.push('\n');
        }
        out
    }
}

/// Formats a CSC structure `(indptr, indices, values)` as coordinate lines.
///
/// With `transpose` the emitted row and column slots are swapped, which
/// writes a CSR structure without touching the arrays.
pub struct CscFormatter<'a, P, I, V> {
    indptr: &'a [P],
    indices: &'a [I],
    values: &'a [V],
    col: usize,
    ncols: usize,
    nnz_per_column: f64,
    transpose: bool,
}

impl<'a, P: IndexLike, I: IndexLike, V: FieldValue> CscFormatter<'a, P, I, V> {
    pub fn new(
        indptr: &'a [P],
        indices: &'a [I],
        values: &'a [V],
        transpose: bool,
    ) -> Result<Self> {
        if indptr.is_empty() {
            return Err(Error::invalid_argument(
                "column pointer range must hold at least one entry",
            ));
        }
        if indices.len() != values.len() && !values.is_empty() {
            return Err(Error::invalid_argument(
                "index and value ranges must have equal length",
            ));
        }
        let ncols = indptr.len() - 1;
        let nnz = indices.len();
        for w in indptr.windows(2) {
            if w[1].as_u64() < w[0].as_u64() {
                return Err(Error::invalid_argument(
                    "column pointers must be non-decreasing",
                ));
            }
        }
        if indptr[ncols].as_usize() != nnz {
            return Err(Error::invalid_argument(format!(
                "last column pointer {} does not match nnz {}",
                indptr[ncols].as_u64(),
                nnz
            )));
        }
        let nnz_per_column = if ncols == 0 {
            0.0
        } else {
            nnz as f64 / ncols as f64
        };
        Ok(Self {
            indptr,
            indices,
            values,
            col: 0,
            ncols,
            nnz_per_column,
            transpose,
        })
    }
}

impl<'a, P: IndexLike, I: IndexLike, V: FieldValue> Formatter for CscFormatter<'a, P, I, V> {
    type Chunk = CscChunk<'a, P, I, V>;

    fn has_next(&self) -> bool {
        self.col < self.ncols
    }

    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk {
        // Bound each chunk's expected record count via the average column
        // density.
        let cols = (self.nnz_per_column * options.chunk_size_values as f64) as usize + 1;
        let col_end = (self.col + cols).min(self.ncols);
        let chunk = CscChunk {
            indptr: self.indptr,
            indices: self.indices,
            values: self.values,
            col_start: self.col,
            col_end,
            precision: options.precision,
            transpose: self.transpose,
        };
        self.col = col_end;
        chunk
    }
}

pub struct CscChunk<'a, P, I, V> {
    indptr: &'a [P],
    indices: &'a [I],
    values: &'a [V],
    col_start: usize,
    col_end: usize,
    precision: Option<usize>,
    transpose: bool,
}

impl<P: IndexLike, I: IndexLike, V: FieldValue> ChunkProducer for CscChunk<'_, P, I, V> {
    fn render(self) -> String {
        let expected =
            (self.indptr[self.col_end].as_usize()).saturating_sub(self.indptr[self.col_start].as_usize());
        let mut out = String::with_capacity(expected * TRIPLET_RECORD_HINT + 16);
        for col in self.col_start..self.col_end {
            let start = self.indptr[col].as_usize();
            let end = self.indptr[col + 1].as_usize();
            for k in start..end {
                let row = self.indices[k].as_u64();
                if self.transpose {
                    push_index(&mut out, col as u64);
                    out.push(' ');
                    push_index(&mut out, row);
                } else {
                    push_index(&mut out, row);
                    out.push(' ');
                    push_index(&mut out, col as u64);
                }
                if !self.values.is_empty() {
                    out.push(' ');
                    self.values[k].write_text(&mut out, self.precision);
                }
                out.push('\n');
            }
        }
        out
    }
}

/// Formats anything addressable as `f(row, col)` in column-major order.
pub struct Dense2dFormatter<'a, F, V> {
    values: &'a F,
    nrows: u64,
    ncols: u64,
    col: u64,
    _marker: PhantomData<fn() -> V>,
}

impl<'a, F, V> Dense2dFormatter<'a, F, V>
where
    F: Fn(u64, u64) -> V + Sync,
    V: FieldValue,
{
    pub fn new(values: &'a F, nrows: u64, ncols: u64) -> Self {
        Self {
            values,
            nrows,
            ncols,
            col: 0,
            _marker: PhantomData,
        }
    }
}

impl<'a, F, V> Formatter for Dense2dFormatter<'a, F, V>
where
    F: Fn(u64, u64) -> V + Sync,
    V: FieldValue,
{
    type Chunk = Dense2dChunk<'a, F, V>;

    fn has_next(&self) -> bool {
        self.col < self.ncols
    }

    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk {
        let cols = (self.nrows as u128)
            .saturating_mul(options.chunk_size_values as u128)
            .saturating_add(1)
            .min((self.ncols - self.col) as u128) as u64;
        let chunk = Dense2dChunk {
            values: self.values,
            nrows: self.nrows,
            col_start: self.col,
            col_end: self.col + cols,
            precision: options.precision,
            _marker: PhantomData,
        };
        self.col += cols;
        chunk
    }
}

pub struct Dense2dChunk<'a, F, V> {
    values: &'a F,
    nrows: u64,
    col_start: u64,
    col_end: u64,
    precision: Option<usize>,
    _marker: PhantomData<fn() -> V>,
}

impl<F, V> ChunkProducer for Dense2dChunk<'_, F, V>
where
    F: Fn(u64, u64) -> V + Sync,
    V: FieldValue,
{
    fn render(self) -> String {
        let cells = (self.col_end - self.col_start) * self.nrows;
        let mut out = String::with_capacity(cells as usize * DENSE_RECORD_HINT);
        for col in self.col_start..self.col_end {
            for row in 0..self.nrows {
                (self.values)(row, col).write_text(&mut out, self.precision);
                out.push('\n');
            }
        }
        out
    }
}
