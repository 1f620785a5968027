//! Fast, parallel reader and writer for the Matrix Market exchange format.
//!
//! Matrix Market is a line-oriented textual encoding for sparse and dense
//! matrices and vectors: an ASCII banner and dimension line, then a body of
//! either `row col [value]` coordinate triplets or one dense value per line
//! in column-major order. The format is trivial; reading multi-gigabyte
//! files at memory-bandwidth speeds is not. This crate keeps the hot paths
//! fast with
//!
//! - a **pipelined chunked reader**: the input is sliced into newline-aligned
//!   chunks on the I/O thread while line counting and parsing fan out over a
//!   worker pool. Line counts retire in stream order, so every chunk knows
//!   its absolute line number even though parsing finishes out of order,
//!   which keeps array positions, record offsets, and error messages exact.
//! - **generic formatters** that stream text chunks straight out of
//!   caller-owned triplet, CSC/CSR, or dense storage without materializing
//!   intermediate records, and a write pipeline that renders chunks in
//!   parallel while flushing them strictly in order.
//! - a **field codec** built on `itoa`/`ryu`, so floats default to the
//!   shortest representation that re-parses to the identical bit pattern.
//!
//! ## Reading
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> fastmm::Result<()> {
//! let mut reader = BufReader::new(File::open("matrix.mtx")?);
//! let (header, (rows, cols, values)) =
//!     fastmm::read_matrix_market_coo::<_, f64>(&mut reader, &Default::default())?;
//! assert_eq!(rows.len(), header.nnz as usize);
//! # Ok(())
//! # }
//! ```
//!
//! Custom [`MatrixSink`] implementations receive records streamed at known
//! body offsets instead of collecting them; a sink that declares
//! [`SinkFlags::parallel_ok`] gets chunk handlers on worker threads.
//!
//! ## Writing
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufWriter;
//! use fastmm::{MatrixMarketHeader, Field, TripletFormatter, WriteOptions};
//!
//! # fn main() -> fastmm::Result<()> {
//! let (rows, cols, values) = (vec![0u64, 1], vec![1u64, 0], vec![3.5f64, -1.0]);
//! let header = MatrixMarketHeader::coordinate_matrix(2, 2, 2, Field::Real);
//! let mut formatter = TripletFormatter::new(&rows, &cols, &values)?;
//! let mut writer = BufWriter::new(File::create("out.mtx")?);
//! fastmm::write_matrix_market(&mut writer, &header, &mut formatter, &WriteOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Line numbering is deterministic and strictly in stream order; parse
//!   errors name the absolute 1-based source line.
//! - Output bytes never depend on `chunk_size_values` or thread count.
//! - Record delivery order across chunks is unspecified under a parallel
//!   sink; the merged collectors restore body order.
//!
//! Symmetry is parsed and passed through; expanding symmetric storage to
//! general form is a post-pass left to the caller.

pub mod chunks;
pub mod error;
pub mod field;
pub mod formatters;
pub mod header;
pub mod options;
pub(crate) mod parse;
pub mod read;
pub mod sink;
pub mod write;

pub use error::{Error, Result};
pub use field::{Complex64, FieldValue, Pattern};
pub use formatters::{
    ChunkProducer, CscFormatter, Dense2dFormatter, DenseVectorFormatter, Formatter, IndexLike,
    TripletFormatter,
};
pub use header::{read_header, write_header, Field, Format, MatrixMarketHeader, Object, Symmetry};
pub use options::{ReadOptions, WriteOptions};
pub use read::{
    read_matrix_body, read_matrix_market_array, read_matrix_market_coo, read_matrix_market_vector,
    read_vector_body,
};
pub use sink::{
    ArrayCollector, ChunkSink, CooCollector, MatrixSink, SinkFlags, VectorChunkSink,
    VectorCollector, VectorSink,
};
pub use write::{write_body, write_body_threads, write_matrix_market};
