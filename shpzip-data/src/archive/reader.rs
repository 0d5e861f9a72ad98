//! Composite reader over a shapefile packed in a ZIP archive.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek};

use camino::Utf8Path;
use log::{debug, warn};
use shpzip_core::{Companion, EntryNaming, Field, ReadError, SequentialReader, Shape};
use zip::result::ZipError;

use super::container::{Container, EntryStream, Release};
use super::opener::{PairNames, open_pair};
use super::resolver::{EntryRequest, resolve_pair, shape_entries};
use super::{ArchiveError, ReleaseFailure, ReleaseFailures};
use crate::shapefile::ShapefileReader;

/// Location reported for archives supplied as byte streams.
const STREAM_LOCATION: &str = "<stream>";

/// Cursor over the records of one shapefile inside a ZIP archive.
///
/// The facade forwards cursor calls to a [`SequentialReader`] built from the
/// resolved geometry entry and its optional attribute companion. Archives
/// opened from a path are owned by the facade and released by
/// [`close`](Self::close); archives supplied as streams remain the caller's.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use shpzip_data::ZipShapeReader;
///
/// let mut reader = ZipShapeReader::open(Utf8Path::new("parcels.zip"))?;
/// while reader.advance() {
///     if let Some((index, shape)) = reader.shape() {
///         println!("{index}: {:?} {}", shape.shape_type(), reader.attribute(0));
///     }
/// }
/// if let Some(err) = reader.error() {
///     eprintln!("stopped early: {err}");
/// }
/// reader.close()?;
/// # Ok::<(), shpzip_data::ArchiveError>(())
/// ```
pub struct ZipShapeReader<R = ShapefileReader<EntryStream>> {
    reader: Option<R>,
    archive: Option<Box<dyn Release>>,
    entry: String,
}

impl<R: fmt::Debug> fmt::Debug for ZipShapeReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipShapeReader")
            .field("reader", &self.reader)
            .field("owns_archive", &self.archive.is_some())
            .field("entry", &self.entry)
            .finish()
    }
}

impl ZipShapeReader<ShapefileReader<EntryStream>> {
    /// Open the archive at `path` and its single `.shp` entry.
    ///
    /// # Errors
    /// [`ArchiveError::ContainerOpen`] when the archive cannot be opened,
    /// [`ArchiveError::EntryNotFound`] or [`ArchiveError::AmbiguousEntry`]
    /// when discovery does not find exactly one geometry entry, and
    /// [`ArchiveError::OpenEntry`] when that entry cannot be read.
    pub fn open(path: &Utf8Path) -> Result<Self, ArchiveError> {
        Self::open_with(path, &EntryNaming::default())
    }

    /// Like [`open`](Self::open), recognising entries with `naming`.
    ///
    /// # Errors
    /// See [`open`](Self::open).
    pub fn open_with(path: &Utf8Path, naming: &EntryNaming) -> Result<Self, ArchiveError> {
        Self::open_archive(path, EntryRequest::Single, naming, ShapefileReader::new)
    }

    /// Open the archive at `path` and the entry named exactly `entry`.
    ///
    /// # Errors
    /// [`ArchiveError::EntryNotFound`] when no entry has that name, otherwise
    /// as [`open`](Self::open).
    pub fn open_named(path: &Utf8Path, entry: &str) -> Result<Self, ArchiveError> {
        Self::open_named_with(path, entry, &EntryNaming::default())
    }

    /// Like [`open_named`](Self::open_named), deriving the companion with
    /// `naming`.
    ///
    /// # Errors
    /// See [`open_named`](Self::open_named).
    pub fn open_named_with(
        path: &Utf8Path,
        entry: &str,
        naming: &EntryNaming,
    ) -> Result<Self, ArchiveError> {
        Self::open_archive(path, EntryRequest::Named(entry), naming, ShapefileReader::new)
    }

    /// Read an archive from `source` and open its single `.shp` entry.
    ///
    /// `source` is drained but not retained; pass `&mut stream` to keep
    /// ownership. The facade never releases a caller's stream.
    ///
    /// # Errors
    /// [`ArchiveError::ReadStream`] when `source` cannot be drained,
    /// otherwise as [`open`](Self::open).
    pub fn from_reader<S: Read>(source: S) -> Result<Self, ArchiveError> {
        Self::from_reader_with(source, &EntryNaming::default())
    }

    /// Like [`from_reader`](Self::from_reader), recognising entries with
    /// `naming`.
    ///
    /// # Errors
    /// See [`from_reader`](Self::from_reader).
    pub fn from_reader_with<S: Read>(
        source: S,
        naming: &EntryNaming,
    ) -> Result<Self, ArchiveError> {
        Self::from_stream(source, EntryRequest::Single, naming, ShapefileReader::new)
    }
}

impl<R: SequentialReader> ZipShapeReader<R> {
    /// Open the archive at `path`, resolve `request` and hand the entry
    /// streams to `build`.
    ///
    /// The facade owns the archive and releases it on close.
    ///
    /// # Errors
    /// See [`ZipShapeReader::open`] and [`ZipShapeReader::open_named`].
    pub fn open_archive<F>(
        path: &Utf8Path,
        request: EntryRequest<'_>,
        naming: &EntryNaming,
        build: F,
    ) -> Result<Self, ArchiveError>
    where
        F: FnOnce(EntryStream, Companion<EntryStream>) -> R,
    {
        let container = open_path(path)?;
        let (reader, entry, container) = Self::assemble(container, request, naming, build)?;
        Ok(Self::from_parts(reader, Some(Box::new(container)), entry))
    }

    /// Read an archive from `source`, resolve `request` and hand the entry
    /// streams to `build`.
    ///
    /// The facade holds no archive handle afterwards.
    ///
    /// # Errors
    /// See [`ZipShapeReader::from_reader`].
    pub fn from_stream<S, F>(
        source: S,
        request: EntryRequest<'_>,
        naming: &EntryNaming,
        build: F,
    ) -> Result<Self, ArchiveError>
    where
        S: Read,
        F: FnOnce(EntryStream, Companion<EntryStream>) -> R,
    {
        let container = open_stream(source)?;
        let (reader, entry, _container) = Self::assemble(container, request, naming, build)?;
        Ok(Self::from_parts(reader, None, entry))
    }

    pub(crate) fn from_parts(
        reader: R,
        archive: Option<Box<dyn Release>>,
        entry: impl Into<String>,
    ) -> Self {
        Self {
            reader: Some(reader),
            archive,
            entry: entry.into(),
        }
    }

    fn assemble<C, F>(
        mut container: Container<C>,
        request: EntryRequest<'_>,
        naming: &EntryNaming,
        build: F,
    ) -> Result<(R, String, Container<C>), ArchiveError>
    where
        C: Read + Seek,
        F: FnOnce(EntryStream, Companion<EntryStream>) -> R,
    {
        let names = PairNames::from(resolve_pair(container.entries(), request, naming)?);
        let (primary, companion) = open_pair(&mut container, &names)?;
        debug!("opened {:?} from {}", names.primary, container.location());
        Ok((build(primary, companion), names.primary, container))
    }

    /// Move to the next record.
    ///
    /// Returns `false` at end of data, after a decode fault, or once closed.
    pub fn advance(&mut self) -> bool {
        self.reader.as_mut().is_some_and(SequentialReader::advance)
    }

    /// Zero-based index and geometry of the current record.
    #[must_use]
    pub fn shape(&self) -> Option<(usize, &Shape)> {
        self.reader.as_ref().and_then(SequentialReader::shape)
    }

    /// Value of attribute column `field` for the current record.
    ///
    /// Empty when there is no companion, no current record, or `field` is
    /// out of range.
    #[must_use]
    pub fn attribute(&self, field: usize) -> &str {
        self.reader
            .as_ref()
            .map_or("", |reader| reader.attribute(field))
    }

    /// Attribute schema; empty without a companion.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        match &self.reader {
            Some(reader) => reader.fields(),
            None => &[],
        }
    }

    /// Decode fault that ended iteration, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ReadError> {
        self.reader.as_ref().and_then(SequentialReader::error)
    }

    /// Name of the geometry entry backing this reader.
    #[must_use]
    pub fn entry_name(&self) -> &str {
        &self.entry
    }

    /// Whether [`close`](Self::close) will release an archive handle.
    ///
    /// Only archives opened from a path are owned; the flag clears once
    /// the handle is released.
    #[must_use]
    pub const fn owns_archive(&self) -> bool {
        self.archive.is_some()
    }

    /// Whether [`close`](Self::close) has already run.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Release the reader and, when owned, the archive.
    ///
    /// Every release is attempted even if an earlier one fails. Calling
    /// `close` again does nothing and returns `Ok`.
    ///
    /// # Errors
    /// [`ArchiveError::ResourceRelease`] carrying every failure in the order
    /// the releases were attempted.
    pub fn close(&mut self) -> Result<(), ArchiveError> {
        let mut failures = Vec::new();
        if let Some(mut reader) = self.reader.take()
            && let Err(err) = reader.close()
        {
            warn!("failed to close reader for {:?}: {err}", self.entry);
            failures.push(ReleaseFailure::Reader(err));
        }
        if let Some(archive) = self.archive.take()
            && let Err(err) = archive.release()
        {
            warn!("failed to release archive for {:?}: {err}", self.entry);
            failures.push(ReleaseFailure::Archive(err));
        }
        ReleaseFailures::into_result(failures)
    }
}

/// Names of the `.shp` entries in the archive at `path`, in archive order.
///
/// The archive is released before returning.
///
/// # Errors
/// [`ArchiveError::ContainerOpen`] when the archive cannot be opened.
pub fn list_shapes(path: &Utf8Path) -> Result<Vec<String>, ArchiveError> {
    list_shapes_with(path, &EntryNaming::default())
}

/// Like [`list_shapes`], recognising entries with `naming`.
///
/// # Errors
/// See [`list_shapes`].
pub fn list_shapes_with(
    path: &Utf8Path,
    naming: &EntryNaming,
) -> Result<Vec<String>, ArchiveError> {
    let container = open_path(path)?;
    Ok(entry_names(&container, naming))
}

/// Names of the geometry entries in an archive read from `source`.
///
/// # Errors
/// [`ArchiveError::ReadStream`] when `source` cannot be drained and
/// [`ArchiveError::ContainerOpen`] when its bytes are not a ZIP archive.
pub fn list_shapes_in<S: Read>(
    source: S,
    naming: &EntryNaming,
) -> Result<Vec<String>, ArchiveError> {
    let container = open_stream(source)?;
    Ok(entry_names(&container, naming))
}

fn entry_names<C>(container: &Container<C>, naming: &EntryNaming) -> Vec<String>
where
    C: Read + Seek,
{
    shape_entries(container.entries(), naming)
        .map(|entry| entry.name.clone())
        .collect()
}

fn open_path(path: &Utf8Path) -> Result<Container<File>, ArchiveError> {
    let file = shpzip_fs::open_utf8_file(path).map_err(|err| ArchiveError::ContainerOpen {
        location: path.to_string(),
        source: ZipError::Io(err),
    })?;
    Container::open(file, path.as_str())
}

fn open_stream<S: Read>(mut source: S) -> Result<Container<Cursor<Vec<u8>>>, ArchiveError> {
    let mut bytes = Vec::new();
    source
        .read_to_end(&mut bytes)
        .map_err(|err| ArchiveError::ReadStream { source: err })?;
    Container::open(Cursor::new(bytes), STREAM_LOCATION)
}
