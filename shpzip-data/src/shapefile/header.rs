//! Shapefile main header.

use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use geo::{Coord, Rect};
use shpzip_core::{ReadError, ShapeType, StreamKind};

pub(crate) const HEADER_LENGTH: usize = 100;
const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;

/// Fields of the 100-byte main header that readers rely on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MainHeader {
    pub(crate) shape_type: ShapeType,
    /// Declared file length in bytes.
    pub(crate) file_length: u64,
    /// `None` when the header carries an empty or non-finite box.
    pub(crate) bounds: Option<Rect<f64>>,
}

pub(crate) fn read_main_header<R: Read>(reader: &mut R) -> Result<MainHeader, ReadError> {
    let mut buf = [0_u8; HEADER_LENGTH];
    reader.read_exact(&mut buf).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            invalid("stream is shorter than the 100-byte header")
        } else {
            ReadError::Io {
                stream: StreamKind::Geometry,
                source,
            }
        }
    })?;

    let file_code = BigEndian::read_i32(&buf[0..4]);
    if file_code != FILE_CODE {
        return Err(invalid(format!("unexpected file code {file_code}")));
    }
    let version = LittleEndian::read_i32(&buf[28..32]);
    if version != VERSION {
        return Err(invalid(format!("unsupported version {version}")));
    }
    let code = LittleEndian::read_i32(&buf[32..36]);
    let shape_type =
        ShapeType::from_code(code).ok_or_else(|| invalid(format!("unsupported shape type {code}")))?;
    let words = BigEndian::read_i32(&buf[24..28]);
    let file_length = u64::try_from(words)
        .map(|half_words| half_words * 2)
        .map_err(|_| invalid(format!("negative file length {words}")))?;

    let mut extent = [0.0_f64; 4];
    LittleEndian::read_f64_into(&buf[36..68], &mut extent);
    let [min_x, min_y, max_x, max_y] = extent;
    let bounds = (extent.iter().all(|value| value.is_finite()) && min_x <= max_x && min_y <= max_y)
        .then(|| Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }));

    Ok(MainHeader {
        shape_type,
        file_length,
        bounds,
    })
}

fn invalid(reason: impl Into<String>) -> ReadError {
    ReadError::InvalidHeader {
        stream: StreamKind::Geometry,
        reason: reason.into(),
    }
}
