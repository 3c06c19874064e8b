/*!
A low-level library for reading the file structures of the Zoner
Draw/Callisto, Zoner Zebra and Zoner Bitmap formats.

This crate implements the byte-level layer of the formats: a checked
little-endian reader and the file, record and region headers of the three
container families. It deliberately stops below any drawing semantics, so
that higher layers can build the actual document model on top of it.

All structures here are parsed from untrusted input: every read is
bounds-checked, every header validates its declared sizes and offsets, and
failures are reported through [`Error`] instead of panicking.
*/

#![deny(missing_docs)]

use std::fmt;

pub mod bmi;
pub mod reader;
pub mod zbr;
pub mod zmf4;

/// An error produced while reading a file structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input ended in the middle of a structure.
    EndOfStream,
    /// A seek outside of the input.
    SeekFailed,
    /// The data is structurally invalid (bad signature, bad size, an
    /// out-of-range count).
    Invalid,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EndOfStream => write!(f, "unexpected end of stream"),
            Error::SeekFailed => write!(f, "seek outside of the input"),
            Error::Invalid => write!(f, "structurally invalid data"),
        }
    }
}

impl std::error::Error for Error {}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
