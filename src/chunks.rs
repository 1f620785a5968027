//! Newline-aligned chunking of the input stream, plus the line counter that
//! drives positional accounting.

use std::io::BufRead;
use std::io::Read;

use memchr::{memchr, memchr_iter};

/// Count newline bytes using SIMD-accelerated memchr.
#[inline]
pub fn count_lines(data: &[u8]) -> u64 {
    memchr_iter(b'\n', data).count() as u64
}

/// Read the next chunk from `reader`.
///
/// The chunk ends exactly after a newline (or at end of stream) and never
/// splits a line: if a line runs past `target_bytes`, the chunk extends to
/// the next newline. An empty buffer signals end of stream.
///
/// Only the I/O thread calls this; no locking is involved.
pub fn next_chunk<R: BufRead>(reader: &mut R, target_bytes: usize) -> std::io::Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(target_bytes + 128);
    reader
        .by_ref()
        .take(target_bytes.max(1) as u64)
        .read_to_end(&mut chunk)?;
    if !chunk.is_empty() && chunk.last() != Some(&b'\n') {
        // finish the straddling line
        reader.read_until(b'\n', &mut chunk)?;
    }
    Ok(chunk)
}

/// Iterator over the lines of a chunk, excluding newline bytes.
pub(crate) struct Lines<'a> {
    buf: &'a [u8],
    pos: usize,
}

pub(crate) fn lines(buf: &[u8]) -> Lines<'_> {
    Lines { buf, pos: 0 }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.pos..];
        match memchr(b'\n', rest) {
            Some(i) => {
                self.pos += i + 1;
                Some(&rest[..i])
            }
            None => {
                self.pos = self.buf.len();
                Some(rest)
            }
        }
    }
}
