//! Sequential decoding of shapefile geometry and dBase attribute streams.
//!
//! [`ShapefileReader`] implements [`SequentialReader`] over any pair of byte
//! streams: loose files on disk, or entries extracted from an archive.
//! Each [`advance`](SequentialReader::advance) decodes one geometry record
//! and, when a companion is present, the attribute row with the same index.

use std::fs::File;
use std::io::{self, BufReader, Read};

use byteorder::{BigEndian, ByteOrder};
use camino::{Utf8Path, Utf8PathBuf};
use geo::Rect;
use log::{debug, warn};
use shpzip_core::{
    CloseError, Companion, EntryNaming, Field, ReadError, SequentialReader, Shape, ShapeType,
    StreamKind,
};
use thiserror::Error;

mod header;
mod record;
mod table;

use header::{HEADER_LENGTH, MainHeader, read_main_header};
use record::decode_shape;
use table::AttributeTable;

/// Bytes in a record header: big-endian record number and content length.
const RECORD_HEADER_LENGTH: usize = 8;

/// Failure opening a shapefile from the filesystem.
#[derive(Debug, Error)]
#[error("failed to open shapefile at {path}: {source}")]
pub struct ShapefileOpenError {
    /// Path of the geometry file.
    pub path: Utf8PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}

#[derive(Debug)]
struct Record {
    index: usize,
    shape: Shape,
    row: Vec<String>,
}

/// Lockstep reader over a geometry stream `S` and attribute stream `D`.
///
/// Construction never fails: header faults are recorded and reported by
/// [`error`](SequentialReader::error) once `advance` returns `false`.
///
/// # Examples
/// ```
/// use std::io::Cursor;
/// use shpzip_core::{Companion, SequentialReader};
/// use shpzip_data::ShapefileReader;
///
/// let mut reader = ShapefileReader::new(Cursor::new(Vec::new()), Companion::<Cursor<Vec<u8>>>::Absent);
/// assert!(!reader.advance());
/// assert!(reader.error().is_some(), "an empty stream has no header");
/// ```
#[derive(Debug)]
pub struct ShapefileReader<S, D = S> {
    shapes: Option<S>,
    table: Option<AttributeTable<D>>,
    header: Option<MainHeader>,
    offset: u64,
    next_index: usize,
    current: Option<Record>,
    exhausted: bool,
    error: Option<ReadError>,
}

impl ShapefileReader<BufReader<File>> {
    /// Open `path` and its `.dbf` sibling from the filesystem.
    ///
    /// The sibling is optional: a missing or unreadable attribute file
    /// yields a reader without attributes.
    ///
    /// # Errors
    /// Returns [`ShapefileOpenError`] when the geometry file cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self, ShapefileOpenError> {
        let shapes = shpzip_fs::open_utf8_file(path).map_err(|source| ShapefileOpenError {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = EntryNaming::default();
        let sibling = path.with_extension(extension.attribute_extension().trim_start_matches('.'));
        let attributes = match shpzip_fs::open_optional_utf8_file(&sibling) {
            Ok(Some(file)) => Companion::Present(BufReader::new(file)),
            Ok(None) => {
                debug!("no attribute table at {sibling}");
                Companion::Absent
            }
            Err(err) => {
                warn!("ignoring unreadable attribute table at {sibling}: {err}");
                Companion::Absent
            }
        };
        Ok(Self::new(BufReader::new(shapes), attributes))
    }
}

impl<S: Read, D: Read> ShapefileReader<S, D> {
    /// Wrap a geometry stream and an optional attribute stream.
    #[must_use]
    pub fn new(shapes: S, attributes: Companion<D>) -> Self {
        let mut reader = Self {
            shapes: Some(shapes),
            table: None,
            header: None,
            offset: 0,
            next_index: 0,
            current: None,
            exhausted: false,
            error: None,
        };
        if let Some(stream) = reader.shapes.as_mut() {
            match read_main_header(stream) {
                Ok(header) => {
                    reader.header = Some(header);
                    reader.offset = HEADER_LENGTH as u64;
                }
                Err(err) => {
                    reader.finish(Some(err));
                    return reader;
                }
            }
        }
        match attributes {
            Companion::Present(stream) => match AttributeTable::open(stream) {
                Ok(table) => reader.table = Some(table),
                Err(err) => reader.finish(Some(err)),
            },
            Companion::Absent => {}
        }
        reader
    }

    /// Shape type declared by the main header.
    ///
    /// `None` when the header could not be read.
    #[must_use]
    pub fn shape_type(&self) -> Option<ShapeType> {
        self.header.map(|header| header.shape_type)
    }

    /// Bounding box declared by the main header.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.header.and_then(|header| header.bounds)
    }

    /// Whether an attribute stream backs this reader.
    #[must_use]
    pub const fn has_attributes(&self) -> bool {
        self.table.is_some()
    }

    fn finish(&mut self, error: Option<ReadError>) {
        self.exhausted = true;
        self.current = None;
        if let Some(err) = error {
            debug!("stopping after decode fault: {err}");
            self.error = Some(err);
        }
    }

    fn read_next(&mut self) -> Result<Option<Record>, ReadError> {
        let Some(shapes) = self.shapes.as_mut() else {
            return Ok(None);
        };
        let declared = self
            .header
            .map(|header| header.file_length)
            .filter(|length| *length >= HEADER_LENGTH as u64);
        if declared.is_some_and(|length| self.offset >= length) {
            return Ok(None);
        }

        let index = self.next_index;
        let mut record_header = [0_u8; RECORD_HEADER_LENGTH];
        match read_full(shapes, &mut record_header).map_err(geometry_io)? {
            0 => return Ok(None),
            RECORD_HEADER_LENGTH => {}
            partial => {
                return Err(malformed(
                    index,
                    format!("record header truncated after {partial} bytes"),
                ));
            }
        }
        let words = BigEndian::read_i32(&record_header[4..8]);
        let length = u64::try_from(words)
            .ok()
            .and_then(|half_words| half_words.checked_mul(2))
            .ok_or_else(|| malformed(index, format!("negative content length {words}")))?;

        let mut content = Vec::new();
        shapes
            .by_ref()
            .take(length)
            .read_to_end(&mut content)
            .map_err(geometry_io)?;
        if (content.len() as u64) < length {
            return Err(malformed(
                index,
                format!("content ended after {} of {length} bytes", content.len()),
            ));
        }
        self.offset += RECORD_HEADER_LENGTH as u64 + length;

        let shape = decode_shape(index, &content)?;
        let row = match self.table.as_mut() {
            Some(table) => table.next_row(index)?,
            None => Vec::new(),
        };
        self.next_index = index + 1;
        Ok(Some(Record { index, shape, row }))
    }
}

impl<S: Read, D: Read> SequentialReader for ShapefileReader<S, D> {
    fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.read_next() {
            Ok(Some(record)) => {
                self.current = Some(record);
                true
            }
            Ok(None) => {
                self.finish(None);
                false
            }
            Err(err) => {
                self.finish(Some(err));
                false
            }
        }
    }

    fn shape(&self) -> Option<(usize, &Shape)> {
        self.current
            .as_ref()
            .map(|record| (record.index, &record.shape))
    }

    fn attribute(&self, field: usize) -> &str {
        self.current
            .as_ref()
            .and_then(|record| record.row.get(field))
            .map_or("", String::as_str)
    }

    fn fields(&self) -> &[Field] {
        match &self.table {
            Some(table) => table.fields(),
            None => &[],
        }
    }

    fn error(&self) -> Option<&ReadError> {
        self.error.as_ref()
    }

    fn close(&mut self) -> Result<(), CloseError> {
        // Dropping the streams releases them; in-memory and file streams
        // report nothing further on release.
        self.shapes = None;
        self.table = None;
        self.current = None;
        self.exhausted = true;
        Ok(())
    }
}

/// Fill `buf` from `reader`, returning fewer bytes only at end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let Some(rest) = buf.get_mut(filled..) else {
            break;
        };
        match reader.read(rest) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn malformed(record: usize, reason: String) -> ReadError {
    ReadError::MalformedRecord { record, reason }
}

fn geometry_io(source: io::Error) -> ReadError {
    ReadError::Io {
        stream: StreamKind::Geometry,
        source,
    }
}

#[cfg(test)]
mod tests;
