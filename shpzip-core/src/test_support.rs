//! Test-only readers and fixture builders shared by unit and behaviour tests.
//!
//! The fixture builders write minimal but well-formed shapefile, dBase and
//! ZIP payloads so tests never depend on binary files checked into the tree.

use std::io::{self, Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use geo::{Coord, LineString, Rect};
use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{CloseError, Field, ReadError, SequentialReader, Shape, StreamKind};

/// Shared counter recording how many times a resource was released.
#[derive(Debug, Clone, Default)]
pub struct ReleaseCounter(Arc<AtomicUsize>);

impl ReleaseCounter {
    /// Record one release.
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of releases recorded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory [`SequentialReader`] driven by a fixed script of records.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    shapes: Vec<Shape>,
    rows: Vec<Vec<String>>,
    fields: Vec<Field>,
    fail_at: Option<usize>,
    close_failure: Option<String>,
    next_index: usize,
    current: Option<usize>,
    exhausted: bool,
    closed: bool,
    error: Option<ReadError>,
    counter: ReleaseCounter,
}

impl ScriptedReader {
    /// Create a reader yielding `shapes` without attributes.
    pub fn with_shapes<I>(shapes: I) -> Self
    where
        I: IntoIterator<Item = Shape>,
    {
        Self {
            shapes: shapes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Attach an attribute schema and one row per record.
    #[must_use]
    pub fn with_attributes(mut self, fields: Vec<Field>, rows: Vec<Vec<String>>) -> Self {
        self.fields = fields;
        self.rows = rows;
        self
    }

    /// Report a decode fault when advancing onto record `index`.
    #[must_use]
    pub const fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Make `close` fail with `message`.
    #[must_use]
    pub fn failing_close(mut self, message: impl Into<String>) -> Self {
        self.close_failure = Some(message.into());
        self
    }

    /// Counts calls to `close` that reached the streams.
    #[must_use]
    pub fn counter(&self) -> ReleaseCounter {
        self.counter.clone()
    }
}

impl SequentialReader for ScriptedReader {
    fn advance(&mut self) -> bool {
        if self.exhausted || self.closed {
            return false;
        }
        let index = self.next_index;
        if self.fail_at == Some(index) {
            self.error = Some(ReadError::MalformedRecord {
                record: index,
                reason: "scripted fault".to_owned(),
            });
        }
        if self.error.is_some() || index >= self.shapes.len() {
            self.exhausted = true;
            self.current = None;
            return false;
        }
        self.current = Some(index);
        self.next_index = index + 1;
        true
    }

    fn shape(&self) -> Option<(usize, &Shape)> {
        let index = self.current?;
        self.shapes.get(index).map(|shape| (index, shape))
    }

    fn attribute(&self, field: usize) -> &str {
        self.current
            .and_then(|index| self.rows.get(index))
            .and_then(|row| row.get(field))
            .map_or("", String::as_str)
    }

    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn error(&self) -> Option<&ReadError> {
        self.error.as_ref()
    }

    fn close(&mut self) -> Result<(), CloseError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.current = None;
        self.counter.record();
        match self.close_failure.take() {
            Some(message) => Err(CloseError::new(StreamKind::Geometry, io::Error::other(message))),
            None => Ok(()),
        }
    }
}

/// Builder for a shapefile geometry stream and its dBase companion.
#[derive(Debug, Clone, Default)]
pub struct ShapefileFixture {
    shapes: Vec<Shape>,
    fields: Vec<Field>,
    rows: Vec<Vec<String>>,
}

impl ShapefileFixture {
    /// Start an empty fixture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a geometry record.
    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Append a column to the attribute schema.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append an attribute row.
    #[must_use]
    pub fn with_row(mut self, values: &[&str]) -> Self {
        self.rows
            .push(values.iter().map(|value| (*value).to_owned()).collect());
        self
    }

    /// Geometry records in insertion order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Encode the geometry stream.
    ///
    /// # Errors
    /// Fails when a record or the file exceeds the format's size limits.
    pub fn shp_bytes(&self) -> io::Result<Vec<u8>> {
        let mut records = Vec::new();
        for (index, shape) in self.shapes.iter().enumerate() {
            let content = encode_shape(shape)?;
            records.write_i32::<BigEndian>(to_i32(index + 1)?)?;
            records.write_i32::<BigEndian>(to_i32(content.len() >> 1)?)?;
            records.write_all(&content)?;
        }

        let shape_type = self
            .shapes
            .iter()
            .find(|shape| !matches!(shape, Shape::Null))
            .map_or(0, |shape| shape.shape_type().code());
        let bounds = self
            .shapes
            .iter()
            .filter_map(Shape::bounding_rect)
            .reduce(merge_rects);

        let mut out = Vec::with_capacity(100 + records.len());
        out.write_i32::<BigEndian>(9994)?;
        for _ in 0..5 {
            out.write_i32::<BigEndian>(0)?;
        }
        out.write_i32::<BigEndian>(to_i32((100 + records.len()) >> 1)?)?;
        out.write_i32::<LittleEndian>(1000)?;
        out.write_i32::<LittleEndian>(shape_type)?;
        write_rect(&mut out, bounds)?;
        for _ in 0..4 {
            out.write_f64::<LittleEndian>(0.0)?;
        }
        out.write_all(&records)?;
        Ok(out)
    }

    /// Encode the dBase III attribute stream.
    ///
    /// # Errors
    /// Fails when the schema does not fit the dBase header fields.
    pub fn dbf_bytes(&self) -> io::Result<Vec<u8>> {
        let header_length = 32 + 32 * self.fields.len() + 1;
        let record_length = 1 + self
            .fields
            .iter()
            .map(|field| usize::from(field.length))
            .sum::<usize>();

        let mut out = Vec::new();
        out.write_all(&[0x03, 124, 1, 1])?;
        out.write_u32::<LittleEndian>(to_u32(self.rows.len())?)?;
        out.write_u16::<LittleEndian>(to_u16(header_length)?)?;
        out.write_u16::<LittleEndian>(to_u16(record_length)?)?;
        out.write_all(&[0; 20])?;

        for field in &self.fields {
            let mut name = [0_u8; 11];
            for (slot, byte) in name.iter_mut().zip(field.name.bytes().take(10)) {
                *slot = byte;
            }
            out.write_all(&name)?;
            out.write_u8(field.field_type.as_byte())?;
            out.write_all(&[0; 4])?;
            out.write_u8(field.length)?;
            out.write_u8(field.decimals)?;
            out.write_all(&[0; 14])?;
        }
        out.write_u8(0x0D)?;

        for row in &self.rows {
            out.write_u8(b' ')?;
            for (index, field) in self.fields.iter().enumerate() {
                let value = row.get(index).map_or("", String::as_str);
                out.write_all(&pad_value(value, field))?;
            }
        }
        out.write_u8(0x1A)?;
        Ok(out)
    }
}

/// Pack `entries` into an uncompressed ZIP archive, preserving order.
///
/// # Errors
/// Propagates failures from the ZIP writer.
pub fn zip_archive<'a, I>(entries: I) -> ZipResult<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(name, options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

fn encode_shape(shape: &Shape) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_i32::<LittleEndian>(shape.shape_type().code())?;
    match shape {
        Shape::Null => {}
        Shape::Point(point) => {
            out.write_f64::<LittleEndian>(point.x())?;
            out.write_f64::<LittleEndian>(point.y())?;
        }
        Shape::MultiPoint(points) => {
            write_rect(&mut out, shape.bounding_rect())?;
            out.write_i32::<LittleEndian>(to_i32(points.0.len())?)?;
            for point in &points.0 {
                out.write_f64::<LittleEndian>(point.x())?;
                out.write_f64::<LittleEndian>(point.y())?;
            }
        }
        Shape::PolyLine(lines) => {
            let parts: Vec<&LineString<f64>> = lines.0.iter().collect();
            write_parts(&mut out, shape.bounding_rect(), &parts)?;
        }
        Shape::Polygon(polygons) => {
            let rings: Vec<&LineString<f64>> = polygons
                .0
                .iter()
                .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
                .collect();
            write_parts(&mut out, shape.bounding_rect(), &rings)?;
        }
    }
    Ok(out)
}

fn write_parts(
    out: &mut Vec<u8>,
    bounds: Option<Rect<f64>>,
    parts: &[&LineString<f64>],
) -> io::Result<()> {
    write_rect(out, bounds)?;
    let total: usize = parts.iter().map(|part| part.0.len()).sum();
    out.write_i32::<LittleEndian>(to_i32(parts.len())?)?;
    out.write_i32::<LittleEndian>(to_i32(total)?)?;
    let mut start = 0;
    for part in parts {
        out.write_i32::<LittleEndian>(to_i32(start)?)?;
        start += part.0.len();
    }
    for coord in parts.iter().flat_map(|part| part.0.iter()) {
        out.write_f64::<LittleEndian>(coord.x)?;
        out.write_f64::<LittleEndian>(coord.y)?;
    }
    Ok(())
}

const ORIGIN: Coord<f64> = Coord { x: 0.0, y: 0.0 };

fn write_rect(out: &mut Vec<u8>, bounds: Option<Rect<f64>>) -> io::Result<()> {
    let (min, max) = bounds.map_or((ORIGIN, ORIGIN), |rect| (rect.min(), rect.max()));
    for value in [min.x, min.y, max.x, max.y] {
        out.write_f64::<LittleEndian>(value)?;
    }
    Ok(())
}

fn merge_rects(lhs: Rect<f64>, rhs: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: lhs.min().x.min(rhs.min().x),
            y: lhs.min().y.min(rhs.min().y),
        },
        Coord {
            x: lhs.max().x.max(rhs.max().x),
            y: lhs.max().y.max(rhs.max().y),
        },
    )
}

fn pad_value(value: &str, field: &Field) -> Vec<u8> {
    let width = usize::from(field.length);
    let bytes: Vec<u8> = value.bytes().take(width).collect();
    let padding = vec![b' '; width - bytes.len()];
    match field.field_type {
        crate::FieldType::Numeric | crate::FieldType::Float => [padding, bytes].concat(),
        _ => [bytes, padding].concat(),
    }
}

fn to_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value).map_err(io::Error::other)
}

fn to_u32(value: usize) -> io::Result<u32> {
    u32::try_from(value).map_err(io::Error::other)
}

fn to_u16(value: usize) -> io::Result<u16> {
    u16::try_from(value).map_err(io::Error::other)
}
