//! Errors surfaced by sequential readers.

use std::{fmt, io};

use thiserror::Error;

/// Which of the paired streams an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// The required geometry stream.
    Geometry,
    /// The optional attribute-table stream.
    Attribute,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry => f.write_str("geometry"),
            Self::Attribute => f.write_str("attribute"),
        }
    }
}

/// Decode faults that halt iteration.
///
/// A reader records the fault and reports it through
/// [`SequentialReader::error`](crate::SequentialReader::error) once
/// [`SequentialReader::advance`](crate::SequentialReader::advance) returns
/// `false`. The reader stays closable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// Reading from a stream failed.
    #[error("failed to read {stream} stream: {source}")]
    Io {
        /// Stream that failed.
        stream: StreamKind,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A stream header was truncated or carried unexpected values.
    #[error("invalid {stream} header: {reason}")]
    InvalidHeader {
        /// Stream whose header was rejected.
        stream: StreamKind,
        /// Description of the rejected value.
        reason: String,
    },
    /// A record used a shape type this crate cannot decode.
    #[error("record {record} has unsupported shape type code {code}")]
    UnsupportedShapeType {
        /// Zero-based record index.
        record: usize,
        /// Raw shape type code.
        code: i32,
    },
    /// A geometry record was truncated or internally inconsistent.
    #[error("record {record} is malformed: {reason}")]
    MalformedRecord {
        /// Zero-based record index.
        record: usize,
        /// Description of the inconsistency.
        reason: String,
    },
    /// The attribute table ran out of rows before the geometry stream ended.
    #[error("attribute table has no row for record {record}")]
    AttributeMismatch {
        /// Zero-based record index without a row.
        record: usize,
    },
}

/// Failure releasing a reader's streams.
#[derive(Debug, Error)]
#[error("failed to release {stream} stream: {source}")]
pub struct CloseError {
    /// Stream whose release failed.
    pub stream: StreamKind,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}

impl CloseError {
    /// Construct a release failure for `stream`.
    #[must_use]
    pub fn new(stream: StreamKind, source: io::Error) -> Self {
        Self { stream, source }
    }
}
