//! Decoding shapefile datasets from loose files and ZIP archives.
//!
//! - [`shapefile`] decodes a `.shp` geometry stream and its optional `.dbf`
//!   attribute table in lockstep.
//! - [`archive`] resolves a dataset inside a ZIP archive and exposes it
//!   through [`ZipShapeReader`].
//!
//! Diagnostics go through the `log` facade; install a logger to see which
//! entries were selected and which releases failed.

#![forbid(unsafe_code)]

pub mod archive;
pub mod shapefile;

pub use archive::{
    ArchiveEntry, ArchiveError, EntryRequest, EntryStream, Release, ReleaseFailure,
    ReleaseFailures, ZipShapeReader, list_shapes, list_shapes_in, list_shapes_with,
};
pub use shapefile::{ShapefileOpenError, ShapefileReader};
