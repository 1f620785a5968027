//! Field codec: conversion between body tokens and numeric scalars.
//!
//! Formatting avoids locale lookup and per-call heap allocation: integers go
//! through `itoa` and floats through `ryu`, whose default output is the
//! shortest form that re-parses to the identical bit pattern.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::header::Field;

/// Parse a signed decimal integer token.
pub fn parse_integer(tok: &str) -> std::result::Result<i64, String> {
    tok.parse::<i64>()
        .map_err(|_| format!("invalid integer '{tok}'"))
}

/// Parse a floating-point token. Accepts every form the formatter produces,
/// including scientific notation and non-finite spellings.
pub fn parse_float(tok: &str) -> std::result::Result<f64, String> {
    tok.parse::<f64>().map_err(|_| format!("invalid real '{tok}'"))
}

/// Append a formatted integer to `out`.
pub fn write_integer<I: itoa::Integer>(out: &mut String, n: I) {
    let mut buf = itoa::Buffer::new();
    out.push_str(buf.format(n));
}

/// Append a formatted float to `out`. `precision` of `None` is shortest
/// round-trip; an explicit precision renders scientific notation with that
/// many fractional digits.
pub fn write_float(out: &mut String, x: f64, precision: Option<usize>) {
    match precision {
        None => {
            let mut buf = ryu::Buffer::new();
            out.push_str(buf.format(x));
        }
        Some(p) => {
            let _ = write!(out, "{x:.p$e}");
        }
    }
}

/// Complex scalar as stored in `complex` bodies: two floats per entry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// Value slot of a `pattern` entry: structure only, no token on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pattern;

/// Scalar types that can occupy the value slot of a body record.
///
/// Implementations decode themselves from the remaining whitespace tokens of
/// one line and append their canonical text form to an output buffer. Both
/// directions stay monomorphized in the per-record hot loops.
pub trait FieldValue: Copy + Default + Send + Sync + 'static {
    /// Header field this scalar matches.
    fn field() -> Field;

    /// Decode one value from the token stream of a body line. The error
    /// string carries no line number; the parser attaches it.
    fn read_tokens<'a, I: Iterator<Item = &'a str>>(
        tokens: &mut I,
    ) -> std::result::Result<Self, String>;

    /// Append the canonical text form to `out`.
    fn write_text(&self, out: &mut String, precision: Option<usize>);
}

impl FieldValue for i64 {
    fn field() -> Field {
        Field::Integer
    }

    fn read_tokens<'a, I: Iterator<Item = &'a str>>(
        tokens: &mut I,
    ) -> std::result::Result<Self, String> {
        let tok = tokens.next().ok_or("expected value token")?;
        parse_integer(tok)
    }

    fn write_text(&self, out: &mut String, _precision: Option<usize>) {
        write_integer(out, *self);
    }
}

impl FieldValue for f64 {
    fn field() -> Field {
        Field::Real
    }

    fn read_tokens<'a, I: Iterator<Item = &'a str>>(
        tokens: &mut I,
    ) -> std::result::Result<Self, String> {
        let tok = tokens.next().ok_or("expected value token")?;
        parse_float(tok)
    }

    fn write_text(&self, out: &mut String, precision: Option<usize>) {
        write_float(out, *self, precision);
    }
}

impl FieldValue for f32 {
    fn field() -> Field {
        Field::Real
    }

    fn read_tokens<'a, I: Iterator<Item = &'a str>>(
        tokens: &mut I,
    ) -> std::result::Result<Self, String> {
        let tok = tokens.next().ok_or("expected value token")?;
        tok.parse::<f32>().map_err(|_| format!("invalid real '{tok}'"))
    }

    fn write_text(&self, out: &mut String, precision: Option<usize>) {
        match precision {
            None => {
                let mut buf = ryu::Buffer::new();
                out.push_str(buf.format(*self));
            }
            Some(p) => {
                let _ = write!(out, "{self:.p$e}");
            }
        }
    }
}

impl FieldValue for Complex64 {
    fn field() -> Field {
        Field::Complex
    }

    fn read_tokens<'a, I: Iterator<Item = &'a str>>(
        tokens: &mut I,
    ) -> std::result::Result<Self, String> {
        let re = tokens.next().ok_or("expected value token")?;
        let im = tokens.next().ok_or("expected imaginary component")?;
        Ok(Complex64::new(parse_float(re)?, parse_float(im)?))
    }

    fn write_text(&self, out: &mut String, precision: Option<usize>) {
        write_float(out, self.re, precision);
        out.push(' ');
        write_float(out, self.im, precision);
    }
}

impl FieldValue for Pattern {
    fn field() -> Field {
        Field::Pattern
    }

    fn read_tokens<'a, I: Iterator<Item = &'a str>>(
        tokens: &mut I,
    ) -> std::result::Result<Self, String> {
        match tokens.next() {
            Some(tok) => Err(format!("unexpected value '{tok}' on a pattern entry")),
            None => Ok(Pattern),
        }
    }

    fn write_text(&self, _out: &mut String, _precision: Option<usize>) {}
}

/// Check that the header field can be decoded into `V`.
pub(crate) fn check_compatible(header_field: Field, value_field: Field) -> Result<()> {
    let ok = match header_field {
        Field::Integer => value_field == Field::Integer,
        Field::Real | Field::Double => value_field == Field::Real,
        Field::Complex => value_field == Field::Complex,
        Field::Pattern => value_field == Field::Pattern,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::unsupported(format!(
            "cannot decode a '{header_field}' file into '{value_field}' values"
        )))
    }
}
