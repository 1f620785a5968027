//! Matrix Market header model: the `%%MatrixMarket` banner, comment block,
//! and dimension line.
//!
//! The header is a short line-oriented preamble:
//!
//! ```text
//! %%MatrixMarket matrix coordinate real general
//! % optional comment lines
//! nrows ncols nnz
//! ```
//!
//! [`read_header`] consumes exactly the preamble from a `BufRead`, leaving
//! the stream positioned at the first body line, and records how many lines
//! it consumed so body line numbers stay absolute.

use std::fmt;
use std::io::{BufRead, Write};

use crate::error::{Error, Result};
use crate::options::WriteOptions;

const BANNER: &str = "%%MatrixMarket";

/// What the file stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Object {
    Matrix,
    Vector,
}

/// How the body encodes entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Sparse `row col [value]` triplet lines.
    Coordinate,
    /// Dense value-per-line body in column-major order.
    Array,
}

/// Scalar type of the value slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Integer,
    Real,
    /// Synonym of `real` kept for files that spell it out.
    Double,
    Complex,
    /// Structure only, no value tokens.
    Pattern,
}

/// Symmetry declared by the header. The core passes this through; expansion
/// is a caller post-pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
    Hermitian,
}

impl Object {
    fn from_keyword(tok: &str) -> Option<Self> {
        if tok.eq_ignore_ascii_case("matrix") {
            Some(Object::Matrix)
        } else if tok.eq_ignore_ascii_case("vector") {
            Some(Object::Vector)
        } else {
            None
        }
    }
}

impl Format {
    fn from_keyword(tok: &str) -> Option<Self> {
        if tok.eq_ignore_ascii_case("coordinate") {
            Some(Format::Coordinate)
        } else if tok.eq_ignore_ascii_case("array") {
            Some(Format::Array)
        } else {
            None
        }
    }
}

impl Field {
    fn from_keyword(tok: &str) -> Option<Self> {
        if tok.eq_ignore_ascii_case("integer") {
            Some(Field::Integer)
        } else if tok.eq_ignore_ascii_case("real") {
            Some(Field::Real)
        } else if tok.eq_ignore_ascii_case("double") {
            Some(Field::Double)
        } else if tok.eq_ignore_ascii_case("complex") {
            Some(Field::Complex)
        } else if tok.eq_ignore_ascii_case("pattern") {
            Some(Field::Pattern)
        } else {
            None
        }
    }
}

impl Symmetry {
    fn from_keyword(tok: &str) -> Option<Self> {
        if tok.eq_ignore_ascii_case("general") {
            Some(Symmetry::General)
        } else if tok.eq_ignore_ascii_case("symmetric") {
            Some(Symmetry::Symmetric)
        } else if tok.eq_ignore_ascii_case("skew-symmetric") {
            Some(Symmetry::SkewSymmetric)
        } else if tok.eq_ignore_ascii_case("hermitian") {
            Some(Symmetry::Hermitian)
        } else {
            None
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Matrix => write!(f, "matrix"),
            Object::Vector => write!(f, "vector"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Coordinate => write!(f, "coordinate"),
            Format::Array => write!(f, "array"),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Integer => write!(f, "integer"),
            Field::Real => write!(f, "real"),
            Field::Double => write!(f, "double"),
            Field::Complex => write!(f, "complex"),
            Field::Pattern => write!(f, "pattern"),
        }
    }
}

impl fmt::Display for Symmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symmetry::General => write!(f, "general"),
            Symmetry::Symmetric => write!(f, "symmetric"),
            Symmetry::SkewSymmetric => write!(f, "skew-symmetric"),
            Symmetry::Hermitian => write!(f, "hermitian"),
        }
    }
}

/// Parsed Matrix Market preamble.
///
/// For vectors, `nrows` holds the vector length and `ncols` is 1.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixMarketHeader {
    pub object: Object,
    pub format: Format,
    pub field: Field,
    pub symmetry: Symmetry,
    pub nrows: u64,
    pub ncols: u64,
    /// Number of body records. For array bodies this is `nrows * ncols`.
    pub nnz: u64,
    /// Comment block without the leading `%` markers, lines joined by `\n`.
    pub comment: String,
    /// Lines consumed by the preamble; body line numbering starts here.
    pub header_line_count: u64,
}

impl MatrixMarketHeader {
    /// Header for a sparse `nrows x ncols` matrix with `nnz` entries.
    pub fn coordinate_matrix(nrows: u64, ncols: u64, nnz: u64, field: Field) -> Self {
        Self {
            object: Object::Matrix,
            format: Format::Coordinate,
            field,
            symmetry: Symmetry::General,
            nrows,
            ncols,
            nnz,
            comment: String::new(),
            header_line_count: 0,
        }
    }

    /// Header for a dense `nrows x ncols` matrix.
    pub fn array_matrix(nrows: u64, ncols: u64, field: Field) -> Self {
        Self {
            object: Object::Matrix,
            format: Format::Array,
            field,
            symmetry: Symmetry::General,
            nrows,
            ncols,
            nnz: nrows.saturating_mul(ncols),
            comment: String::new(),
            header_line_count: 0,
        }
    }

    /// Header for a sparse vector of the given length with `nnz` entries.
    pub fn coordinate_vector(length: u64, nnz: u64, field: Field) -> Self {
        Self {
            object: Object::Vector,
            format: Format::Coordinate,
            field,
            symmetry: Symmetry::General,
            nrows: length,
            ncols: 1,
            nnz,
            comment: String::new(),
            header_line_count: 0,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.format == Format::Array && self.field == Field::Pattern {
            return Err(Error::unsupported(
                "array format cannot carry a pattern field",
            ));
        }
        if self.object == Object::Vector && self.symmetry != Symmetry::General {
            return Err(Error::unsupported("vectors must declare general symmetry"));
        }
        if self.format == Format::Coordinate {
            if let Some(cap) = self.nrows.checked_mul(self.ncols) {
                if self.nnz > cap && self.symmetry == Symmetry::General {
                    return Err(Error::invalid_value(format!(
                        "nnz {} exceeds matrix capacity {}",
                        self.nnz, cap
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_dim(tok: Option<&str>, name: &str, line: u64) -> Result<u64> {
    let tok = tok.ok_or_else(|| Error::parse(line, format!("missing {name}")))?;
    tok.parse::<u64>()
        .map_err(|_| Error::parse(line, format!("invalid {name} '{tok}'")))
}

/// Read the header from `reader`, leaving it positioned at the first body
/// line.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<MatrixMarketHeader> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(Error::parse(1, "empty input, expected Matrix Market banner"));
    }
    let mut lines_read: u64 = 1;

    let mut tokens = line.split_ascii_whitespace();
    let banner = tokens.next().unwrap_or("");
    if !banner.eq_ignore_ascii_case(BANNER) {
        return Err(Error::parse(
            1,
            format!("expected '{BANNER}' banner, found '{banner}'"),
        ));
    }
    let object = tokens
        .next()
        .and_then(Object::from_keyword)
        .ok_or_else(|| Error::parse(1, "invalid or missing object keyword"))?;
    let format = tokens
        .next()
        .and_then(Format::from_keyword)
        .ok_or_else(|| Error::parse(1, "invalid or missing format keyword"))?;
    let field = tokens
        .next()
        .and_then(Field::from_keyword)
        .ok_or_else(|| Error::parse(1, "invalid or missing field keyword"))?;
    let symmetry = tokens
        .next()
        .and_then(Symmetry::from_keyword)
        .ok_or_else(|| Error::parse(1, "invalid or missing symmetry keyword"))?;

    // Comment block, then the dimension line. Blank lines are tolerated.
    let mut comment_lines: Vec<String> = Vec::new();
    let dim_line;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(Error::parse(
                lines_read,
                "unexpected end of input before dimension line",
            ));
        }
        lines_read += 1;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if let Some(rest) = trimmed.strip_prefix('%') {
            comment_lines.push(rest.to_string());
        } else if trimmed.trim().is_empty() {
            continue;
        } else {
            dim_line = trimmed.to_string();
            break;
        }
    }

    let mut dims = dim_line.split_ascii_whitespace();
    let (nrows, ncols, nnz) = match (object, format) {
        (Object::Matrix, Format::Coordinate) => {
            let nrows = parse_dim(dims.next(), "nrows", lines_read)?;
            let ncols = parse_dim(dims.next(), "ncols", lines_read)?;
            let nnz = parse_dim(dims.next(), "nnz", lines_read)?;
            (nrows, ncols, nnz)
        }
        (Object::Matrix, Format::Array) => {
            let nrows = parse_dim(dims.next(), "nrows", lines_read)?;
            let ncols = parse_dim(dims.next(), "ncols", lines_read)?;
            (nrows, ncols, nrows.saturating_mul(ncols))
        }
        (Object::Vector, Format::Coordinate) => {
            let length = parse_dim(dims.next(), "length", lines_read)?;
            let nnz = parse_dim(dims.next(), "nnz", lines_read)?;
            (length, 1, nnz)
        }
        (Object::Vector, Format::Array) => {
            let length = parse_dim(dims.next(), "length", lines_read)?;
            (length, 1, length)
        }
    };

    let header = MatrixMarketHeader {
        object,
        format,
        field,
        symmetry,
        nrows,
        ncols,
        nnz,
        comment: comment_lines.join("\n"),
        header_line_count: lines_read,
    };
    header.validate()?;
    Ok(header)
}

/// Write the banner, comment block, and dimension line. Returns the number
/// of lines written.
pub fn write_header<W: Write>(
    writer: &mut W,
    header: &MatrixMarketHeader,
    options: &WriteOptions,
) -> Result<u64> {
    header.validate()?;
    let mut lines: u64 = 1;
    writeln!(
        writer,
        "{BANNER} {} {} {} {}",
        header.object, header.format, header.field, header.symmetry
    )?;

    if header.comment.is_empty() {
        if options.always_comment {
            writeln!(writer, "%")?;
            lines += 1;
        }
    } else {
        for c in header.comment.split('\n') {
            writeln!(writer, "%{c}")?;
            lines += 1;
        }
    }

    match (header.object, header.format) {
        (Object::Matrix, Format::Coordinate) => {
            writeln!(writer, "{} {} {}", header.nrows, header.ncols, header.nnz)?
        }
        (Object::Matrix, Format::Array) => writeln!(writer, "{} {}", header.nrows, header.ncols)?,
        (Object::Vector, Format::Coordinate) => writeln!(writer, "{} {}", header.nrows, header.nnz)?,
        (Object::Vector, Format::Array) => writeln!(writer, "{}", header.nrows)?,
    }
    lines += 1;
    Ok(lines)
}
