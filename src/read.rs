//! Streaming read pipeline.
//!
//! The body is consumed as newline-aligned chunks. Per chunk the pipeline
//! needs a line count before it can parse, because the chunk's global line
//! number determines
//!
//! 1. the row/column position of array values,
//! 2. the chunk's record offset handed to the sink, and
//! 3. the line numbers in error messages.
//!
//! Line counting is much cheaper than parsing, so the threaded pipeline
//! splits the two: the orchestrator thread owns the input stream and slices
//! chunks; line-count tasks retire through a FIFO in stream order, which
//! lets the orchestrator assign strictly increasing line numbers without
//! waiting on the slow parse stage; parse tasks then run unordered on the
//! same pool. New chunks are sliced only while the in-flight task count
//! stays under the cap, which bounds peak memory near
//! `inflight * chunk_size_bytes`.
//!
//! Record delivery is unordered across chunks. Sinks that cannot accept
//! concurrent chunk handlers (no [`SinkFlags::parallel_ok`], or
//! `append_only`) are driven by the sequential engine instead.

use std::collections::VecDeque;
use std::io::BufRead;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tracing::debug;

use crate::chunks;
use crate::error::{Error, Result};
use crate::field::{self, FieldValue};
use crate::header::{Format, MatrixMarketHeader, Object};
use crate::options::ReadOptions;
use crate::parse;
use crate::sink::{MatrixSink, SinkFlags, VectorSink};

/// One fully parsed input chunk, as seen by the pipeline.
trait ChunkParser: Sync {
    fn parse_chunk(&self, chunk: &[u8], chunk_line_start: u64, body_line: u64) -> Result<()>;
}

struct CooMatrixParser<'a, V, S> {
    header: &'a MatrixMarketHeader,
    sink: &'a S,
    _values: PhantomData<fn() -> V>,
}

impl<V: FieldValue, S: MatrixSink<V>> ChunkParser for CooMatrixParser<'_, V, S> {
    fn parse_chunk(&self, chunk: &[u8], chunk_line_start: u64, body_line: u64) -> Result<()> {
        let mut sink = self.sink.chunk_sink(body_line);
        parse::parse_coo_matrix_chunk::<V, _>(chunk, self.header, chunk_line_start, &mut sink)
    }
}

struct ArrayMatrixParser<'a, V, S> {
    header: &'a MatrixMarketHeader,
    sink: &'a S,
    _values: PhantomData<fn() -> V>,
}

impl<V: FieldValue, S: MatrixSink<V>> ChunkParser for ArrayMatrixParser<'_, V, S> {
    fn parse_chunk(&self, chunk: &[u8], chunk_line_start: u64, body_line: u64) -> Result<()> {
        let mut sink = self.sink.chunk_sink(body_line);
        let (row, col) = if self.header.nrows == 0 {
            (0, 0)
        } else {
            (body_line % self.header.nrows, body_line / self.header.nrows)
        };
        parse::parse_array_chunk::<V, _>(chunk, self.header, chunk_line_start, &mut sink, row, col)
    }
}

struct CooVectorParser<'a, V, S> {
    header: &'a MatrixMarketHeader,
    sink: &'a S,
    _values: PhantomData<fn() -> V>,
}

impl<V: FieldValue, S: VectorSink<V>> ChunkParser for CooVectorParser<'_, V, S> {
    fn parse_chunk(&self, chunk: &[u8], chunk_line_start: u64, body_line: u64) -> Result<()> {
        let mut sink = self.sink.chunk_sink(body_line);
        parse::parse_coo_vector_chunk::<V, _>(chunk, self.header, chunk_line_start, &mut sink)
    }
}

struct ArrayVectorParser<'a, V, S> {
    header: &'a MatrixMarketHeader,
    sink: &'a S,
    _values: PhantomData<fn() -> V>,
}

impl<V: FieldValue, S: VectorSink<V>> ChunkParser for ArrayVectorParser<'_, V, S> {
    fn parse_chunk(&self, chunk: &[u8], chunk_line_start: u64, body_line: u64) -> Result<()> {
        let mut sink = self.sink.chunk_sink(body_line);
        parse::parse_array_vector_chunk::<V, _>(
            chunk,
            self.header,
            chunk_line_start,
            &mut sink,
            body_line,
        )
    }
}

/// Read a matrix body from `reader` into `sink`, dispatching on the header
/// format. Returns the total line count seen so far, header included.
pub fn read_matrix_body<R, V, S>(
    reader: &mut R,
    header: &MatrixMarketHeader,
    sink: &S,
    options: &ReadOptions,
) -> Result<u64>
where
    R: BufRead,
    V: FieldValue,
    S: MatrixSink<V>,
{
    if header.object != Object::Matrix {
        return Err(Error::invalid_argument(
            "header object is not 'matrix'; use read_vector_body",
        ));
    }
    field::check_compatible(header.field, V::field())?;
    match header.format {
        Format::Coordinate => {
            let parser = CooMatrixParser {
                header,
                sink,
                _values: PhantomData::<fn() -> V>,
            };
            drive(reader, header, &parser, sink.flags(), options)
        }
        Format::Array => {
            let parser = ArrayMatrixParser {
                header,
                sink,
                _values: PhantomData::<fn() -> V>,
            };
            drive(reader, header, &parser, sink.flags(), options)
        }
    }
}

/// Read a vector body from `reader` into `sink`. Returns the total line
/// count seen so far, header included.
pub fn read_vector_body<R, V, S>(
    reader: &mut R,
    header: &MatrixMarketHeader,
    sink: &S,
    options: &ReadOptions,
) -> Result<u64>
where
    R: BufRead,
    V: FieldValue,
    S: VectorSink<V>,
{
    if header.object != Object::Vector {
        return Err(Error::invalid_argument(
            "header object is not 'vector'; use read_matrix_body",
        ));
    }
    field::check_compatible(header.field, V::field())?;
    match header.format {
        Format::Coordinate => {
            let parser = CooVectorParser {
                header,
                sink,
                _values: PhantomData::<fn() -> V>,
            };
            drive(reader, header, &parser, sink.flags(), options)
        }
        Format::Array => {
            let parser = ArrayVectorParser {
                header,
                sink,
                _values: PhantomData::<fn() -> V>,
            };
            drive(reader, header, &parser, sink.flags(), options)
        }
    }
}

fn drive<R: BufRead, P: ChunkParser>(
    reader: &mut R,
    header: &MatrixMarketHeader,
    parser: &P,
    flags: SinkFlags,
    options: &ReadOptions,
) -> Result<u64> {
    let threads = options.effective_threads();
    if threads > 1 && flags.allows_parallel() {
        read_body_threads(reader, header.header_line_count, parser, options, threads)
    } else {
        read_body_sequential(reader, header.header_line_count, parser, options)
    }
}

/// Single-threaded engine: slice, count, parse, in stream order.
fn read_body_sequential<R: BufRead, P: ChunkParser>(
    reader: &mut R,
    header_line_count: u64,
    parser: &P,
    options: &ReadOptions,
) -> Result<u64> {
    let mut line_num = header_line_count;
    loop {
        let chunk = chunks::next_chunk(reader, options.chunk_size_bytes)?;
        if chunk.is_empty() {
            break;
        }
        let count = chunks::count_lines(&chunk);
        parser.parse_chunk(&chunk, line_num, line_num - header_line_count)?;
        line_num += count;
    }
    Ok(line_num)
}

fn spawn_line_count<'s>(
    scope: &rayon::Scope<'s>,
    chunk: Vec<u8>,
    tasks_total: &Arc<AtomicUsize>,
) -> Receiver<(Vec<u8>, u64)> {
    let (tx, rx) = bounded(1);
    let tasks = Arc::clone(tasks_total);
    tasks_total.fetch_add(1, Ordering::SeqCst);
    scope.spawn(move |_| {
        let count = chunks::count_lines(&chunk);
        let _ = tx.send((chunk, count));
        tasks.fetch_sub(1, Ordering::SeqCst);
    });
    rx
}

/// Threaded engine.
///
/// The orchestrator runs on the calling thread (`in_place_scope`), never
/// inside the pool, so the backpressure loop cannot deadlock against its own
/// workers. It polls the FIFO head instead of blocking and yields the CPU
/// while stalled, keeping short line-count tasks from being starved.
fn read_body_threads<R: BufRead, P: ChunkParser>(
    reader: &mut R,
    header_line_count: u64,
    parser: &P,
    options: &ReadOptions,
    threads: usize,
) -> Result<u64> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::invalid_argument(format!("cannot build thread pool: {e}")))?;

    // Concurrent chunks available to work on. Too few starves workers on
    // uneven chunk costs; too many holds chunk buffers in memory.
    let inflight = 10 * threads;
    debug!(threads, inflight, chunk_size_bytes = options.chunk_size_bytes, "threaded body read");

    let tasks_total = Arc::new(AtomicUsize::new(0));
    let (err_tx, err_rx) = crossbeam_channel::unbounded::<(u64, Error)>();

    let mut line_num = header_line_count;
    let mut fifo: VecDeque<Receiver<(Vec<u8>, u64)>> = VecDeque::new();
    let mut chunk_seq: u64 = 0;
    let mut eof = false;

    let orchestrate = pool.in_place_scope(|scope| -> Result<u64> {
        // Seed the pipeline.
        while !eof && fifo.len() < inflight {
            let chunk = chunks::next_chunk(reader, options.chunk_size_bytes)?;
            if chunk.is_empty() {
                eof = true;
            } else {
                fifo.push_back(spawn_line_count(scope, chunk, &tasks_total));
            }
        }

        // Retire line counts in stream order; dispatch parses unordered.
        while !fifo.is_empty() {
            if !err_rx.is_empty() {
                // a worker failed; stop submitting and let the scope drain
                break;
            }
            if tasks_total.load(Ordering::SeqCst) >= inflight {
                std::thread::yield_now();
                continue;
            }
            let front = match fifo.front() {
                Some(rx) => rx.try_recv(),
                None => break,
            };
            match front {
                Ok((chunk, count)) => {
                    fifo.pop_front();

                    // Replace the retired chunk to keep the pipe full.
                    if !eof {
                        let next = chunks::next_chunk(reader, options.chunk_size_bytes)?;
                        if next.is_empty() {
                            eof = true;
                        } else {
                            fifo.push_back(spawn_line_count(scope, next, &tasks_total));
                        }
                    }

                    let chunk_line_start = line_num;
                    line_num += count;
                    let body_line = chunk_line_start - header_line_count;

                    let seq = chunk_seq;
                    chunk_seq += 1;
                    let err_tx = err_tx.clone();
                    let tasks = Arc::clone(&tasks_total);
                    tasks_total.fetch_add(1, Ordering::SeqCst);
                    scope.spawn(move |_| {
                        if let Err(e) = parser.parse_chunk(&chunk, chunk_line_start, body_line) {
                            let _ = err_tx.send((seq, e));
                        }
                        tasks.fetch_sub(1, Ordering::SeqCst);
                    });
                }
                Err(TryRecvError::Empty) => std::thread::yield_now(),
                Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(line_num)
        // leaving the scope waits for every outstanding task
    });

    // First error in stream order wins over anything later.
    if let Some((_, e)) = err_rx.try_iter().min_by_key(|(seq, _)| *seq) {
        return Err(e);
    }
    orchestrate
}

/// Read a complete coordinate matrix document into `(rows, cols, values)`
/// triplets, 0-based and merged in body order.
pub fn read_matrix_market_coo<R, V>(
    reader: &mut R,
    options: &ReadOptions,
) -> Result<(MatrixMarketHeader, (Vec<u64>, Vec<u64>, Vec<V>))>
where
    R: BufRead,
    V: FieldValue,
{
    let header = crate::header::read_header(reader)?;
    if header.format != Format::Coordinate {
        return Err(Error::unsupported(
            "file is not in coordinate format; use read_matrix_market_array",
        ));
    }
    let sink = crate::sink::CooCollector::new();
    read_matrix_body(reader, &header, &sink, options)?;
    Ok((header, sink.into_triplets()))
}

/// Read a complete array matrix document into a column-major `Vec`.
pub fn read_matrix_market_array<R, V>(
    reader: &mut R,
    options: &ReadOptions,
) -> Result<(MatrixMarketHeader, Vec<V>)>
where
    R: BufRead,
    V: FieldValue,
{
    let header = crate::header::read_header(reader)?;
    if header.format != Format::Array {
        return Err(Error::unsupported(
            "file is not in array format; use read_matrix_market_coo",
        ));
    }
    let sink = crate::sink::ArrayCollector::new(header.nrows, header.ncols)?;
    read_matrix_body(reader, &header, &sink, options)?;
    Ok((header, sink.into_values()))
}

/// Read a complete sparse vector document into `(indices, values)` pairs,
/// 0-based and merged in body order.
pub fn read_matrix_market_vector<R, V>(
    reader: &mut R,
    options: &ReadOptions,
) -> Result<(MatrixMarketHeader, (Vec<u64>, Vec<V>))>
where
    R: BufRead,
    V: FieldValue,
{
    let header = crate::header::read_header(reader)?;
    let sink = crate::sink::VectorCollector::new();
    read_vector_body(reader, &header, &sink, options)?;
    Ok((header, sink.into_pairs()))
}
