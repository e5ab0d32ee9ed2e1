use thiserror::Error;

use crate::{
    array::ArrayError,
    npy::{Mode, parser::HeaderParseError},
};

/// The file contents are not a valid `.npy` stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("bad magic number")]
    BadMagic,
    #[error("unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error("header is not 64-byte aligned: preamble {preamble} + header {header_len}")]
    Misaligned { preamble: usize, header_len: usize },
    #[error("malformed header: {0}")]
    MalformedHeader(#[from] HeaderParseError),
    #[error("header is not ASCII")]
    NonAsciiHeader,
    #[error("boolean payload byte is neither 0 nor 1")]
    InvalidBoolByte,
}

#[derive(Debug, Error)]
pub enum NpyError {
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The stored `descr` doesn't describe the requested element type.
    #[error("type mismatch: file has '{descr}', requested '{expected}'")]
    TypeMismatch { descr: String, expected: String },
    /// The header's shape is not usable for the requested array, or the array to save is
    /// inconsistent.
    #[error("invalid array size: {0}")]
    Size(#[from] ArrayError),
    #[error("cannot {operation} a file opened in {mode:?} mode")]
    Mode {
        mode: Mode,
        operation: &'static str,
    },
    #[error("cannot {operation} a closed file")]
    Closed { operation: &'static str },
    #[error("header of {len} bytes does not fit the requested format version")]
    Capacity { len: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HeaderParseError> for NpyError {
    fn from(e: HeaderParseError) -> Self {
        NpyError::Format(FormatError::MalformedHeader(e))
    }
}
