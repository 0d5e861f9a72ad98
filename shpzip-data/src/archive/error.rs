//! Error types produced while opening, reading and releasing shapefile
//! archives.

use std::{fmt, io};

use shpzip_core::CloseError;
use thiserror::Error;
use zip::result::ZipError;

/// Errors produced by the archive discovery and open operations and by
/// [`ZipShapeReader::close`](super::ZipShapeReader::close).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    /// No entry matched the requested or discovered geometry name.
    #[error("no entry matching {name:?} in archive")]
    EntryNotFound {
        /// Requested entry name, or a `*.ext` pattern when discovering.
        name: String,
    },
    /// Auto-discovery found more than one geometry entry.
    #[error(
        "archive contains {} geometry entries, expected exactly one: {}",
        .candidates.len(),
        .candidates.join(", ")
    )]
    AmbiguousEntry {
        /// Every matching entry name, in archive order.
        candidates: Vec<String>,
    },
    /// The archive could not be opened or its directory could not be read.
    #[error("failed to open archive {location}: {source}")]
    ContainerOpen {
        /// Filesystem path, or `<stream>` for in-memory archives.
        location: String,
        /// Underlying ZIP error.
        #[source]
        source: ZipError,
    },
    /// Draining a caller-supplied archive stream failed.
    #[error("failed to read archive stream: {source}")]
    ReadStream {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The primary entry exists but could not be decompressed.
    #[error("failed to read entry {name:?}: {source}")]
    OpenEntry {
        /// Entry name.
        name: String,
        /// Underlying ZIP error.
        #[source]
        source: ZipError,
    },
    /// Releasing one or more owned resources failed.
    #[error("failed to release resources: {0}")]
    ResourceRelease(ReleaseFailures),
}

/// One failed release attempt.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReleaseFailure {
    /// Closing the sequential reader failed.
    #[error("reader: {0}")]
    Reader(#[source] CloseError),
    /// Releasing the archive handle failed.
    #[error("archive: {0}")]
    Archive(#[source] io::Error),
}

/// Every release failure from a single close, in attempt order.
///
/// `Display` joins all messages so no failure is hidden behind another.
#[derive(Debug)]
pub struct ReleaseFailures(Vec<ReleaseFailure>);

impl ReleaseFailures {
    /// Combine release outcomes into one result.
    ///
    /// Returns `Ok` when `failures` is empty.
    pub(crate) fn into_result(failures: Vec<ReleaseFailure>) -> Result<(), ArchiveError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ArchiveError::ResourceRelease(Self(failures)))
        }
    }

    /// Individual failures in the order release was attempted.
    #[must_use]
    pub fn failures(&self) -> &[ReleaseFailure] {
        &self.0
    }
}

impl fmt::Display for ReleaseFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
