//! Write pipeline: drives a formatter and flushes its chunks to the output
//! stream in hand-out order.
//!
//! The parallel engine renders chunk producers on a worker pool while the
//! orchestrator thread owns the stream, so the output bytes are identical to
//! the sequential engine's regardless of thread count.

use std::collections::VecDeque;
use std::io::Write;

use crossbeam_channel::{bounded, Receiver};
use tracing::debug;

use crate::error::{Error, Result};
use crate::formatters::{ChunkProducer, Formatter};
use crate::header::{write_header, MatrixMarketHeader};
use crate::options::WriteOptions;

/// Sequential engine: render and write each chunk directly.
pub fn write_body<W, F>(writer: &mut W, formatter: &mut F, options: &WriteOptions) -> Result<()>
where
    W: Write,
    F: Formatter,
{
    while formatter.has_next() {
        let chunk = formatter.next_chunk(options);
        writer.write_all(chunk.render().as_bytes())?;
    }
    Ok(())
}

/// Threaded engine: chunk producers render on a worker pool; completed
/// chunks are written strictly in submission order.
pub fn write_body_threads<W, F>(
    writer: &mut W,
    formatter: &mut F,
    options: &WriteOptions,
) -> Result<()>
where
    W: Write,
    F: Formatter,
{
    let threads = options.effective_threads();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::invalid_argument(format!("cannot build thread pool: {e}")))?;
    let inflight = 10 * threads;
    debug!(threads, inflight, chunk_size_values = options.chunk_size_values, "threaded body write");

    let mut fifo: VecDeque<Receiver<String>> = VecDeque::new();
    pool.in_place_scope(|scope| -> Result<()> {
        loop {
            while formatter.has_next() && fifo.len() < inflight {
                let chunk = formatter.next_chunk(options);
                let (tx, rx) = bounded(1);
                scope.spawn(move |_| {
                    let _ = tx.send(chunk.render());
                });
                fifo.push_back(rx);
            }
            match fifo.pop_front() {
                Some(rx) => {
                    let text = rx.recv().expect("chunk producer task panicked");
                    writer.write_all(text.as_bytes())?;
                }
                None => break,
            }
        }
        Ok(())
    })
}

/// Write a complete Matrix Market document: header plus formatter body.
pub fn write_matrix_market<W, F>(
    writer: &mut W,
    header: &MatrixMarketHeader,
    formatter: &mut F,
    options: &WriteOptions,
) -> Result<()>
where
    W: Write,
    F: Formatter,
{
    write_header(writer, header, options)?;
    if options.effective_threads() > 1 {
        write_body_threads(writer, formatter, options)?;
    } else {
        write_body(writer, formatter, options)?;
    }
    writer.flush()?;
    Ok(())
}
