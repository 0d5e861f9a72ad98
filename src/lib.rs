//! Facade crate for reading shapefiles packaged in ZIP archives.
//!
//! This crate re-exports the core domain types and the archive reader so
//! callers need a single dependency.

#![forbid(unsafe_code)]

pub use shpzip_core::{
    CloseError, Companion, EntryNaming, Field, FieldType, ReadError, SequentialReader, Shape,
    ShapeType, StreamKind,
};

pub use shpzip_data::{
    ArchiveEntry, ArchiveError, EntryRequest, EntryStream, ReleaseFailure, ReleaseFailures,
    ShapefileOpenError, ShapefileReader, ZipShapeReader, list_shapes, list_shapes_in,
    list_shapes_with,
};
