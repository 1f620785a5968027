//! Per-chunk body parsers.
//!
//! Each parser walks a newline-aligned chunk line by line, tokenizes on
//! ASCII whitespace, decodes per the monomorphized value type, and delivers
//! exactly one record per non-empty, non-comment line. Blank and `%` lines
//! are skipped but still count toward line numbering, so error messages can
//! name the absolute 1-based source line.

use crate::chunks;
use crate::error::{Error, Result};
use crate::field::FieldValue;
use crate::header::MatrixMarketHeader;
use crate::sink::{ChunkSink, VectorChunkSink};

/// Decode a 1-based wire index, returning it 0-based.
fn parse_index(tok: &str, what: &str, bound: u64, line: u64) -> Result<u64> {
    let n: u64 = tok
        .parse()
        .map_err(|_| Error::parse(line, format!("invalid {what} index '{tok}'")))?;
    if n == 0 || n > bound {
        return Err(Error::parse(
            line,
            format!("{what} index {n} out of range [1, {bound}]"),
        ));
    }
    Ok(n - 1)
}

/// Split a body line into tokens, or `None` for blank and comment lines.
fn body_tokens(line: &[u8], line_no: u64) -> Result<Option<std::str::SplitAsciiWhitespace<'_>>> {
    let text = std::str::from_utf8(line)
        .map_err(|_| Error::parse(line_no, "line is not valid UTF-8"))?;
    let trimmed = text.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('%') {
        return Ok(None);
    }
    Ok(Some(text.split_ascii_whitespace()))
}

/// Parse one chunk of a coordinate matrix body: `row col [value]` per line.
pub(crate) fn parse_coo_matrix_chunk<V, S>(
    chunk: &[u8],
    header: &MatrixMarketHeader,
    chunk_line_start: u64,
    sink: &mut S,
) -> Result<()>
where
    V: FieldValue,
    S: ChunkSink<V>,
{
    for (i, line) in chunks::lines(chunk).enumerate() {
        let line_no = chunk_line_start + i as u64 + 1;
        let Some(mut tokens) = body_tokens(line, line_no)? else {
            continue;
        };
        let row = parse_index(
            tokens.next().unwrap_or_default(),
            "row",
            header.nrows,
            line_no,
        )?;
        let col_tok = tokens
            .next()
            .ok_or_else(|| Error::parse(line_no, "expected column index"))?;
        let col = parse_index(col_tok, "column", header.ncols, line_no)?;
        let value = V::read_tokens(&mut tokens).map_err(|msg| Error::parse(line_no, msg))?;
        sink.handle(row, col, value)?;
    }
    Ok(())
}

/// Parse one chunk of a coordinate vector body: `index [value]` per line.
pub(crate) fn parse_coo_vector_chunk<V, S>(
    chunk: &[u8],
    header: &MatrixMarketHeader,
    chunk_line_start: u64,
    sink: &mut S,
) -> Result<()>
where
    V: FieldValue,
    S: VectorChunkSink<V>,
{
    for (i, line) in chunks::lines(chunk).enumerate() {
        let line_no = chunk_line_start + i as u64 + 1;
        let Some(mut tokens) = body_tokens(line, line_no)? else {
            continue;
        };
        let index = parse_index(
            tokens.next().unwrap_or_default(),
            "vector",
            header.nrows,
            line_no,
        )?;
        let value = V::read_tokens(&mut tokens).map_err(|msg| Error::parse(line_no, msg))?;
        sink.handle(index, value)?;
    }
    Ok(())
}

/// Parse one chunk of an array matrix body: one value per line, advancing
/// in column-major order from the given starting position.
pub(crate) fn parse_array_chunk<V, S>(
    chunk: &[u8],
    header: &MatrixMarketHeader,
    chunk_line_start: u64,
    sink: &mut S,
    mut row: u64,
    mut col: u64,
) -> Result<()>
where
    V: FieldValue,
    S: ChunkSink<V>,
{
    for (i, line) in chunks::lines(chunk).enumerate() {
        let line_no = chunk_line_start + i as u64 + 1;
        let Some(mut tokens) = body_tokens(line, line_no)? else {
            continue;
        };
        if col >= header.ncols {
            return Err(Error::parse(
                line_no,
                format!(
                    "more entries than the declared {} x {} shape",
                    header.nrows, header.ncols
                ),
            ));
        }
        let value = V::read_tokens(&mut tokens).map_err(|msg| Error::parse(line_no, msg))?;
        sink.handle(row, col, value)?;
        row += 1;
        if row == header.nrows {
            row = 0;
            col += 1;
        }
    }
    Ok(())
}

/// Parse one chunk of an array vector body: one value per line.
pub(crate) fn parse_array_vector_chunk<V, S>(
    chunk: &[u8],
    header: &MatrixMarketHeader,
    chunk_line_start: u64,
    sink: &mut S,
    mut index: u64,
) -> Result<()>
where
    V: FieldValue,
    S: VectorChunkSink<V>,
{
    for (i, line) in chunks::lines(chunk).enumerate() {
        let line_no = chunk_line_start + i as u64 + 1;
        let Some(mut tokens) = body_tokens(line, line_no)? else {
            continue;
        };
        if index >= header.nrows {
            return Err(Error::parse(
                line_no,
                format!("more entries than the declared length {}", header.nrows),
            ));
        }
        let value = V::read_tokens(&mut tokens).map_err(|msg| Error::parse(line_no, msg))?;
        sink.handle(index, value)?;
        index += 1;
    }
    Ok(())
}
