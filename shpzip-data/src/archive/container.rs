//! Indexed ZIP container and the release seam for owned archive handles.

use std::io::{self, Cursor, Read, Seek};

use zip::ZipArchive;
use zip::result::ZipError;

use super::{ArchiveEntry, ArchiveError};

/// In-memory byte stream holding one decompressed entry.
pub type EntryStream = Cursor<Vec<u8>>;

/// Upper bound on buffer space reserved up front from a declared entry size.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// A resource held by a facade that must be released exactly once.
///
/// Release consumes the handle, so a second release cannot be expressed.
pub trait Release: Send {
    /// Release the underlying resource.
    ///
    /// # Errors
    /// Returns the I/O error reported while releasing.
    fn release(self: Box<Self>) -> io::Result<()>;
}

/// An opened archive whose entry list was read once at open time.
#[derive(Debug)]
pub(crate) struct Container<R> {
    archive: ZipArchive<R>,
    entries: Vec<ArchiveEntry>,
    location: String,
}

impl<R: Read + Seek> Container<R> {
    /// Open `reader` as a ZIP archive and index its entries in directory order.
    pub(crate) fn open(reader: R, name: impl Into<String>) -> Result<Self, ArchiveError> {
        let location = name.into();
        let mut archive = ZipArchive::new(reader).map_err(|source| ArchiveError::ContainerOpen {
            location: location.clone(),
            source,
        })?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index_raw(index)
                .map_err(|source| ArchiveError::ContainerOpen {
                    location: location.clone(),
                    source,
                })?;
            entries.push(ArchiveEntry {
                name: file.name().to_owned(),
                size: file.size(),
            });
        }
        Ok(Self {
            archive,
            entries,
            location,
        })
    }

    pub(crate) fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub(crate) fn location(&self) -> &str {
        &self.location
    }

    /// Decompress the entry called `name` into memory.
    pub(crate) fn read_entry(&mut self, name: &str) -> Result<EntryStream, ZipError> {
        let mut file = self.archive.by_name(name)?;
        let capacity = usize::try_from(file.size().min(MAX_PREALLOCATION)).unwrap_or(0);
        let mut bytes = Vec::with_capacity(capacity);
        file.read_to_end(&mut bytes)?;
        Ok(Cursor::new(bytes))
    }
}

impl<R: Send> Release for Container<R> {
    fn release(self: Box<Self>) -> io::Result<()> {
        // The archive's reader is closed when dropped; std and cap-std file
        // handles do not surface close errors.
        drop(self);
        Ok(())
    }
}
