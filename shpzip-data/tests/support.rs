//! Shared fixtures for behaviour tests.

use camino::Utf8PathBuf;
use geo::{LineString, MultiLineString, Point};
use shpzip_core::test_support::{ShapefileFixture, zip_archive};
use shpzip_core::{Field, FieldType, Shape};
use std::fs;
use tempfile::TempDir;

/// Parcel names in record order.
pub const PARCEL_NAMES: [&str; 3] = ["Oak Lane", "Mill Pond", "Elm Street"];

/// Road names in record order.
pub const ROAD_NAMES: [&str; 2] = ["High Street", "Station Road"];

/// Three point parcels with a name and an area column.
pub fn parcels() -> ShapefileFixture {
    ShapefileFixture::new()
        .with_field(Field::new("NAME", FieldType::Character, 16, 0))
        .with_field(Field::new("AREA", FieldType::Numeric, 6, 0))
        .with_shape(Shape::Point(Point::new(-1.5, 52.0)))
        .with_shape(Shape::Point(Point::new(-1.4, 52.1)))
        .with_shape(Shape::Point(Point::new(-1.3, 52.2)))
        .with_row(&[PARCEL_NAMES[0], "120"])
        .with_row(&[PARCEL_NAMES[1], "75"])
        .with_row(&[PARCEL_NAMES[2], "310"])
}

/// Two polyline roads with a name column.
pub fn roads() -> ShapefileFixture {
    let segment = |from: (f64, f64), to: (f64, f64)| {
        Shape::PolyLine(MultiLineString::new(vec![LineString::from(vec![from, to])]))
    };
    ShapefileFixture::new()
        .with_field(Field::new("NAME", FieldType::Character, 20, 0))
        .with_shape(segment((0.0, 0.0), (1.0, 0.0)))
        .with_shape(segment((1.0, 0.0), (1.0, 1.0)))
        .with_row(&[ROAD_NAMES[0]])
        .with_row(&[ROAD_NAMES[1]])
}

/// Encode both streams of `fixture`.
pub fn encode(fixture: &ShapefileFixture) -> (Vec<u8>, Vec<u8>) {
    let shp = fixture
        .shp_bytes()
        .unwrap_or_else(|err| panic!("failed to encode geometry fixture: {err}"));
    let dbf = fixture
        .dbf_bytes()
        .unwrap_or_else(|err| panic!("failed to encode attribute fixture: {err}"));
    (shp, dbf)
}

/// Write a ZIP archive holding `entries` into `dir` and return its path.
pub fn write_archive(dir: &TempDir, name: &str, entries: &[(&str, &[u8])]) -> Utf8PathBuf {
    let bytes = zip_archive(entries.iter().copied())
        .unwrap_or_else(|err| panic!("failed to build archive fixture {name}: {err}"));
    let path = utf8_path(dir, name);
    fs::write(&path, bytes).unwrap_or_else(|err| {
        panic!("failed to write archive fixture {path}: {err}");
    });
    path
}

/// UTF-8 path for `name` inside `dir`.
pub fn utf8_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name))
        .unwrap_or_else(|path| panic!("temporary path {path:?} is not UTF-8"))
}
