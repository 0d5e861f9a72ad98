//! Behavioural tests for reading shapefiles out of ZIP archives.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use shpzip_data::{ArchiveError, ZipShapeReader, list_shapes};
use std::{cell::RefCell, fs, path::PathBuf};
use tempfile::TempDir;

mod support;

use support::{PARCEL_NAMES, ROAD_NAMES, encode, parcels, roads, utf8_path, write_archive};

type OpenResult = Result<ZipShapeReader, ArchiveError>;

#[fixture]
fn working_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temporary directory: {err}"),
    }
}

#[fixture]
fn archive_path() -> RefCell<Option<Utf8PathBuf>> {
    RefCell::new(None)
}

#[fixture]
fn open_result() -> RefCell<Option<OpenResult>> {
    RefCell::new(None)
}

#[fixture]
fn listing() -> RefCell<Option<Result<Vec<String>, ArchiveError>>> {
    RefCell::new(None)
}

fn selected_path(archive: &RefCell<Option<Utf8PathBuf>>) -> Utf8PathBuf {
    archive.borrow().clone().expect("archive path prepared")
}

/// Drain the opened reader, returning the first attribute of every record.
fn read_names(result: &RefCell<Option<OpenResult>>) -> Vec<String> {
    let mut guard = result.borrow_mut();
    let reader = guard
        .as_mut()
        .expect("open was attempted")
        .as_mut()
        .expect("expected the archive to open");
    let mut names = Vec::new();
    while reader.advance() {
        let (index, _) = reader.shape().expect("current shape after advance");
        assert_eq!(index, names.len(), "records are numbered in order");
        names.push(reader.attribute(0).to_owned());
    }
    assert!(reader.error().is_none(), "unexpected fault: {:?}", reader.error());
    names
}

#[given("an archive containing a parcels shapefile with its attribute table")]
fn archive_with_table(
    #[from(working_dir)] dir: &TempDir,
    #[from(archive_path)] archive: &RefCell<Option<Utf8PathBuf>>,
) {
    let (shp, dbf) = encode(&parcels());
    let path = write_archive(
        dir,
        "parcels.zip",
        &[
            ("parcels.shp", shp.as_slice()),
            ("parcels.dbf", dbf.as_slice()),
            ("parcels.prj", b"GEOGCS[\"WGS 84\"]".as_slice()),
        ],
    );
    *archive.borrow_mut() = Some(path);
}

#[given("an archive containing a parcels shapefile without an attribute table")]
fn archive_without_table(
    #[from(working_dir)] dir: &TempDir,
    #[from(archive_path)] archive: &RefCell<Option<Utf8PathBuf>>,
) {
    let (shp, _) = encode(&parcels());
    let path = write_archive(dir, "geometry.zip", &[("parcels.shp", shp.as_slice())]);
    *archive.borrow_mut() = Some(path);
}

#[given("an archive containing two shapefiles")]
fn archive_with_two_shapefiles(
    #[from(working_dir)] dir: &TempDir,
    #[from(archive_path)] archive: &RefCell<Option<Utf8PathBuf>>,
) {
    let (parcel_shp, parcel_dbf) = encode(&parcels());
    let (road_shp, road_dbf) = encode(&roads());
    let path = write_archive(
        dir,
        "layers.zip",
        &[
            ("parcels.shp", parcel_shp.as_slice()),
            ("parcels.dbf", parcel_dbf.as_slice()),
            ("roads.shp", road_shp.as_slice()),
            ("roads.dbf", road_dbf.as_slice()),
        ],
    );
    *archive.borrow_mut() = Some(path);
}

#[given("a path to a missing archive")]
fn missing_archive(
    #[from(working_dir)] dir: &TempDir,
    #[from(archive_path)] archive: &RefCell<Option<Utf8PathBuf>>,
) {
    *archive.borrow_mut() = Some(utf8_path(dir, "missing.zip"));
}

#[when("I open the archive")]
fn open_archive(
    #[from(archive_path)] archive: &RefCell<Option<Utf8PathBuf>>,
    #[from(open_result)] result: &RefCell<Option<OpenResult>>,
) {
    let path = selected_path(archive);
    *result.borrow_mut() = Some(ZipShapeReader::open(&path));
}

#[when("I open the roads entry by name")]
fn open_roads(
    #[from(archive_path)] archive: &RefCell<Option<Utf8PathBuf>>,
    #[from(open_result)] result: &RefCell<Option<OpenResult>>,
) {
    let path = selected_path(archive);
    *result.borrow_mut() = Some(ZipShapeReader::open_named(&path, "roads.shp"));
}

#[when("I list the shapefiles in the archive")]
fn list_archive(
    #[from(archive_path)] archive: &RefCell<Option<Utf8PathBuf>>,
    #[from(listing)] listed: &RefCell<Option<Result<Vec<String>, ArchiveError>>>,
) {
    let path = selected_path(archive);
    *listed.borrow_mut() = Some(list_shapes(&path));
}

#[then("every parcel is read with its attribute values")]
fn parcels_with_attributes(#[from(open_result)] result: &RefCell<Option<OpenResult>>) {
    assert_eq!(read_names(result), PARCEL_NAMES);
}

#[then("every parcel is read with empty attribute values")]
fn parcels_without_attributes(#[from(open_result)] result: &RefCell<Option<OpenResult>>) {
    assert_eq!(read_names(result), ["", "", ""]);
}

#[then("every road is read with its attribute values")]
fn roads_with_attributes(#[from(open_result)] result: &RefCell<Option<OpenResult>>) {
    assert_eq!(read_names(result), ROAD_NAMES);
}

#[then("the reader closes cleanly twice")]
fn closes_twice(#[from(open_result)] result: &RefCell<Option<OpenResult>>) {
    let mut guard = result.borrow_mut();
    let reader = guard
        .as_mut()
        .expect("open was attempted")
        .as_mut()
        .expect("expected the archive to open");
    assert!(reader.owns_archive(), "path-opened archives are owned");
    reader.close().expect("first close succeeds");
    reader.close().expect("second close is a no-op");
    assert!(reader.is_closed());
    assert!(!reader.advance(), "a closed reader has no records");
}

#[then("the open fails naming both shapefiles")]
fn ambiguous_open(#[from(open_result)] result: &RefCell<Option<OpenResult>>) {
    let borrowed = result.borrow();
    match borrowed.as_ref().expect("open was attempted") {
        Ok(_) => panic!("expected several shapefiles to be rejected"),
        Err(ArchiveError::AmbiguousEntry { candidates }) => {
            assert_eq!(candidates, &["parcels.shp", "roads.shp"]);
        }
        Err(other) => panic!("expected an ambiguity error, got {other:?}"),
    }
}

#[then("the listing matches the archive order")]
fn listing_order(#[from(listing)] listed: &RefCell<Option<Result<Vec<String>, ArchiveError>>>) {
    let borrowed = listed.borrow();
    let names = borrowed
        .as_ref()
        .expect("listing was attempted")
        .as_ref()
        .expect("expected the archive to list");
    assert_eq!(names, &["parcels.shp", "roads.shp"]);
}

#[then("the open fails because the archive cannot be read")]
fn container_open_failure(#[from(open_result)] result: &RefCell<Option<OpenResult>>) {
    let borrowed = result.borrow();
    match borrowed.as_ref().expect("open was attempted") {
        Ok(_) => panic!("expected the missing archive to fail"),
        Err(ArchiveError::ContainerOpen { location, .. }) => {
            assert!(
                location.ends_with("missing.zip"),
                "unexpected location in error: {location}"
            );
        }
        Err(other) => panic!("expected a container error, got {other:?}"),
    }
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/zip_reader.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<String> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .map(|title| title.to_owned())
        .collect();
    let expected = [
        "reading every record of a packaged shapefile",
        "reading geometry without an attribute table",
        "rejecting an archive with several shapefiles",
        "opening a shapefile by entry name",
        "listing shapefiles in archive order",
        "reporting a missing archive",
    ];
    assert_eq!(
        titles.len(),
        expected.len(),
        "scenario count changed in feature file: {titles:?}"
    );
    for (index, expected_title) in expected.iter().enumerate() {
        let actual = titles.get(index).map(String::as_str);
        assert_eq!(
            actual,
            Some(*expected_title),
            "scenario at index {index} does not match feature order"
        );
    }
}

macro_rules! register_scenario {
    ($name:ident, $index:literal) => {
        #[scenario(path = "tests/features/zip_reader.feature", index = $index)]
        fn $name(
            working_dir: TempDir,
            archive_path: RefCell<Option<Utf8PathBuf>>,
            open_result: RefCell<Option<OpenResult>>,
            listing: RefCell<Option<Result<Vec<String>, ArchiveError>>>,
        ) {
            let _ = (working_dir, archive_path, open_result, listing);
        }
    };
}

register_scenario!(reading_every_record, 0);
register_scenario!(reading_geometry_without_attributes, 1);
register_scenario!(rejecting_several_shapefiles, 2);
register_scenario!(opening_by_entry_name, 3);
register_scenario!(listing_in_archive_order, 4);
register_scenario!(reporting_missing_archive, 5);
