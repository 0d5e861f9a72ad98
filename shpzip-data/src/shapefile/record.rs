//! Geometry record decoding.
//!
//! Record content is decoded from an in-memory slice, so a truncated record
//! surfaces as [`ReadError::MalformedRecord`] rather than an I/O error.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use geo::{Coord, LineString, MultiLineString, MultiPoint, Point};
use shpzip_core::{ReadError, Shape, ShapeType};

/// Bytes taken by one X/Y pair.
const POINT_BYTES: usize = 16;

pub(crate) fn decode_shape(record: usize, content: &[u8]) -> Result<Shape, ReadError> {
    let mut body = RecordBody {
        record,
        cursor: Cursor::new(content),
    };
    let code = body.read_i32()?;
    let shape_type = ShapeType::from_code(code)
        .ok_or(ReadError::UnsupportedShapeType { record, code })?;

    match shape_type.planar() {
        ShapeType::Point => {
            let coord = body.read_coord()?;
            Ok(Shape::Point(Point::from(coord)))
        }
        ShapeType::MultiPoint => {
            body.skip_box()?;
            let count = body.read_count("point")?;
            let coords = body.read_coords(count)?;
            Ok(Shape::MultiPoint(MultiPoint::new(
                coords.into_iter().map(Point::from).collect(),
            )))
        }
        ShapeType::PolyLine => {
            let parts = body.read_parts()?;
            Ok(Shape::PolyLine(MultiLineString::new(parts)))
        }
        ShapeType::Polygon => {
            let rings = body.read_parts()?;
            Ok(Shape::polygon_from_rings(rings))
        }
        _ => Ok(Shape::Null),
    }
}

struct RecordBody<'a> {
    record: usize,
    cursor: Cursor<&'a [u8]>,
}

impl RecordBody<'_> {
    fn malformed(&self, reason: impl Into<String>) -> ReadError {
        ReadError::MalformedRecord {
            record: self.record,
            reason: reason.into(),
        }
    }

    fn remaining(&self) -> usize {
        let consumed = usize::try_from(self.cursor.position()).unwrap_or(usize::MAX);
        self.cursor.get_ref().len().saturating_sub(consumed)
    }

    fn read_i32(&mut self) -> Result<i32, ReadError> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| self.malformed("content ended inside an integer"))
    }

    fn read_f64(&mut self) -> Result<f64, ReadError> {
        self.cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| self.malformed("content ended inside a coordinate"))
    }

    fn read_coord(&mut self) -> Result<Coord<f64>, ReadError> {
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        Ok(Coord { x, y })
    }

    fn skip_box(&mut self) -> Result<(), ReadError> {
        for _ in 0..4 {
            self.read_f64()?;
        }
        Ok(())
    }

    fn read_count(&mut self, what: &str) -> Result<usize, ReadError> {
        let raw = self.read_i32()?;
        usize::try_from(raw).map_err(|_| self.malformed(format!("negative {what} count {raw}")))
    }

    fn read_coords(&mut self, count: usize) -> Result<Vec<Coord<f64>>, ReadError> {
        let needed = count.saturating_mul(POINT_BYTES);
        if needed > self.remaining() {
            return Err(self.malformed(format!(
                "{count} points need {needed} bytes but only {} remain",
                self.remaining()
            )));
        }
        (0..count).map(|_| self.read_coord()).collect()
    }

    /// Read the part index table and points shared by PolyLine and Polygon.
    fn read_parts(&mut self) -> Result<Vec<LineString<f64>>, ReadError> {
        self.skip_box()?;
        let part_count = self.read_count("part")?;
        let point_count = self.read_count("point")?;
        if part_count.saturating_mul(4) > self.remaining() {
            return Err(self.malformed(format!("{part_count} part offsets exceed the record")));
        }
        let mut starts = Vec::with_capacity(part_count);
        for _ in 0..part_count {
            let start = self.read_count("part offset")?;
            if start > point_count || starts.last().is_some_and(|previous| start < *previous) {
                return Err(self.malformed(format!("part offset {start} is out of order")));
            }
            starts.push(start);
        }
        if starts.first().is_some_and(|first| *first != 0) {
            return Err(self.malformed("first part does not start at point 0"));
        }
        let mut coords = self.read_coords(point_count)?;

        let mut parts = Vec::with_capacity(part_count);
        for start in starts.into_iter().rev() {
            let tail = coords.split_off(start);
            parts.push(LineString::new(tail));
        }
        parts.reverse();
        Ok(parts)
    }
}
