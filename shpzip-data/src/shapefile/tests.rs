use super::*;
use camino::Utf8PathBuf;
use geo::{LineString, MultiLineString, Point, coord};
use rstest::{fixture, rstest};
use shpzip_core::FieldType;
use shpzip_core::test_support::ShapefileFixture;
use std::io::Cursor;
use tempfile::TempDir;

type MemoryReader = ShapefileReader<Cursor<Vec<u8>>>;

#[fixture]
fn parcels() -> ShapefileFixture {
    ShapefileFixture::new()
        .with_field(Field::new("NAME", FieldType::Character, 16, 0))
        .with_field(Field::new("ZONE", FieldType::Numeric, 4, 0))
        .with_shape(Shape::Point(Point::new(1.0, 2.0)))
        .with_shape(Shape::Null)
        .with_shape(Shape::PolyLine(MultiLineString::new(vec![LineString::from(
            vec![(0.0, 0.0), (3.0, 4.0)],
        )])))
        .with_row(&["Oak Lane", "12"])
        .with_row(&["Vacant", "0"])
        .with_row(&["Elm Street", "7"])
}

fn memory_reader(fixture: &ShapefileFixture, with_table: bool) -> MemoryReader {
    let shp = fixture.shp_bytes().expect("geometry fixture should encode");
    let attributes = if with_table {
        Companion::Present(Cursor::new(
            fixture.dbf_bytes().expect("table fixture should encode"),
        ))
    } else {
        Companion::Absent
    };
    ShapefileReader::new(Cursor::new(shp), attributes)
}

fn drain(reader: &mut impl SequentialReader) -> Vec<(usize, Shape, String)> {
    let mut seen = Vec::new();
    while reader.advance() {
        let (index, shape) = reader.shape().expect("shape after advance");
        seen.push((index, shape.clone(), reader.attribute(0).to_owned()));
    }
    seen
}

#[rstest]
fn advances_geometry_and_attributes_in_lockstep(parcels: ShapefileFixture) {
    let mut reader = memory_reader(&parcels, true);
    let seen = drain(&mut reader);
    let names: Vec<&str> = seen.iter().map(|(_, _, name)| name.as_str()).collect();
    assert_eq!(names, ["Oak Lane", "Vacant", "Elm Street"]);
    let indices: Vec<usize> = seen.iter().map(|(index, _, _)| *index).collect();
    assert_eq!(indices, [0, 1, 2]);
    let shapes: Vec<Shape> = seen.into_iter().map(|(_, shape, _)| shape).collect();
    assert_eq!(shapes, parcels.shapes());
    assert!(reader.error().is_none());
}

#[rstest]
fn reads_geometry_without_attribute_table(parcels: ShapefileFixture) {
    let mut reader = memory_reader(&parcels, false);
    assert!(reader.fields().is_empty());
    assert!(!reader.has_attributes());
    assert!(reader.advance());
    assert_eq!(reader.shape().map(|(index, _)| index), Some(0));
    assert_eq!(reader.attribute(0), "");
    assert_eq!(drain(&mut reader).len(), 2);
}

#[rstest]
fn exposes_schema_before_first_advance(parcels: ShapefileFixture) {
    let reader = memory_reader(&parcels, true);
    let names: Vec<&str> = reader.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["NAME", "ZONE"]);
    assert!(reader.shape().is_none());
    assert_eq!(reader.attribute(0), "");
}

#[rstest]
fn reports_header_metadata(parcels: ShapefileFixture) {
    let reader = memory_reader(&parcels, false);
    assert_eq!(reader.shape_type(), Some(ShapeType::Point));
    let bounds = reader.bounds().expect("fixture declares bounds");
    assert_eq!(bounds.min(), coord! { x: 0.0, y: 0.0 });
    assert_eq!(bounds.max(), coord! { x: 3.0, y: 4.0 });
}

#[rstest]
fn exhaustion_is_sticky(parcels: ShapefileFixture) {
    let mut reader = memory_reader(&parcels, true);
    drain(&mut reader);
    assert!(!reader.advance());
    assert!(!reader.advance());
    assert!(reader.error().is_none());
    assert!(reader.shape().is_none());
}

#[rstest]
fn truncated_record_stops_iteration(parcels: ShapefileFixture) {
    let mut shp = parcels.shp_bytes().expect("geometry fixture should encode");
    shp.truncate(shp.len() - 5);
    let mut reader: MemoryReader = ShapefileReader::new(Cursor::new(shp), Companion::Absent);
    assert!(reader.advance());
    assert!(reader.advance());
    assert!(!reader.advance());
    assert!(matches!(
        reader.error(),
        Some(ReadError::MalformedRecord { record: 2, .. })
    ));
    assert!(!reader.advance());
    assert!(matches!(
        reader.error(),
        Some(ReadError::MalformedRecord { record: 2, .. })
    ));
    assert_eq!(reader.attribute(0), "");
}

#[rstest]
fn short_attribute_table_is_a_fault() {
    let fixture = ShapefileFixture::new()
        .with_field(Field::new("ID", FieldType::Numeric, 3, 0))
        .with_shape(Shape::Point(Point::new(0.0, 0.0)))
        .with_shape(Shape::Point(Point::new(1.0, 1.0)))
        .with_row(&["1"]);
    let mut reader = memory_reader(&fixture, true);
    assert!(reader.advance());
    assert_eq!(reader.attribute(0), "1");
    assert!(!reader.advance());
    assert!(matches!(
        reader.error(),
        Some(ReadError::AttributeMismatch { record: 1 })
    ));
}

#[rstest]
fn corrupt_attribute_header_stops_before_first_record(parcels: ShapefileFixture) {
    let shp = parcels.shp_bytes().expect("geometry fixture should encode");
    let mut reader: MemoryReader = ShapefileReader::new(
        Cursor::new(shp),
        Companion::Present(Cursor::new(vec![0x03, 0, 0])),
    );
    assert!(!reader.advance());
    assert!(matches!(
        reader.error(),
        Some(ReadError::InvalidHeader {
            stream: StreamKind::Attribute,
            ..
        })
    ));
}

#[rstest]
fn rejects_foreign_file_code() {
    let mut reader: MemoryReader =
        ShapefileReader::new(Cursor::new(vec![0xFF; 100]), Companion::Absent);
    assert!(!reader.advance());
    assert!(matches!(
        reader.error(),
        Some(ReadError::InvalidHeader {
            stream: StreamKind::Geometry,
            ..
        })
    ));
    assert_eq!(reader.shape_type(), None);
}

#[rstest]
fn decodes_polygon_with_hole() {
    let exterior = LineString::from(vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)]);
    let hole = LineString::from(vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0), (2.0, 2.0)]);
    let shape = Shape::polygon_from_rings(vec![exterior, hole]);
    let fixture = ShapefileFixture::new().with_shape(shape.clone());
    let mut reader = memory_reader(&fixture, false);
    assert!(reader.advance());
    assert_eq!(reader.shape().map(|(_, decoded)| decoded), Some(&shape));
}

#[rstest]
fn close_is_idempotent_and_ends_iteration(parcels: ShapefileFixture) {
    let mut reader = memory_reader(&parcels, true);
    assert!(reader.advance());
    reader.close().expect("first close succeeds");
    reader.close().expect("second close is a no-op");
    assert!(!reader.advance());
    assert!(reader.shape().is_none());
    assert!(reader.fields().is_empty());
}

#[fixture]
fn loose_dir() -> TempDir {
    TempDir::new().expect("failed to create temporary directory")
}

fn write_loose(dir: &TempDir, fixture: &ShapefileFixture, with_table: bool) -> Utf8PathBuf {
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .expect("temporary directory should be UTF-8");
    let shp = base.join("parcels.shp");
    std::fs::write(&shp, fixture.shp_bytes().expect("encode geometry")).expect("write .shp");
    if with_table {
        std::fs::write(
            base.join("parcels.dbf"),
            fixture.dbf_bytes().expect("encode table"),
        )
        .expect("write .dbf");
    }
    shp
}

#[rstest]
fn opens_loose_files_with_sibling_table(loose_dir: TempDir, parcels: ShapefileFixture) {
    let path = write_loose(&loose_dir, &parcels, true);
    let mut reader = ShapefileReader::open(&path).expect("loose shapefile should open");
    assert_eq!(reader.fields().len(), 2);
    assert_eq!(drain(&mut reader).len(), 3);
}

#[rstest]
fn opens_loose_files_without_sibling_table(loose_dir: TempDir, parcels: ShapefileFixture) {
    let path = write_loose(&loose_dir, &parcels, false);
    let mut reader = ShapefileReader::open(&path).expect("loose shapefile should open");
    assert!(reader.fields().is_empty());
    assert_eq!(drain(&mut reader).len(), 3);
}

#[rstest]
fn missing_loose_geometry_is_an_open_error(loose_dir: TempDir) {
    let path = Utf8PathBuf::from_path_buf(loose_dir.path().join("absent.shp"))
        .expect("temporary path should be UTF-8");
    let err = ShapefileReader::open(&path).expect_err("missing geometry should fail");
    assert_eq!(err.path, path);
    assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
}
