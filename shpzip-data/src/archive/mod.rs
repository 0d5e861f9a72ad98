//! Reading shapefiles packed inside ZIP archives.
//!
//! Opening happens in three steps. The resolver picks the geometry entry
//! from the archive's entry list and derives its attribute companion. The
//! opener decompresses both entries, collapsing any companion failure to
//! [`Companion::Absent`](shpzip_core::Companion::Absent). Finally
//! [`ZipShapeReader`] hands the streams to a
//! [`SequentialReader`](shpzip_core::SequentialReader) and forwards the
//! cursor protocol to it until [`close`](ZipShapeReader::close).

mod container;
mod error;
mod opener;
mod reader;
mod resolver;

pub use container::{EntryStream, Release};
pub use error::{ArchiveError, ReleaseFailure, ReleaseFailures};
pub use reader::{ZipShapeReader, list_shapes, list_shapes_in, list_shapes_with};
pub use resolver::{
    ArchiveEntry, EntryPair, EntryRequest, resolve_companion, resolve_pair, resolve_primary,
    shape_entries,
};
