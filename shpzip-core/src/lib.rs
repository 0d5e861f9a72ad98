//! Core domain types for reading shapefile datasets.
//!
//! A dataset is a geometry stream paired with an optional attribute table.
//! This crate defines the vocabulary shared by every reader:
//!
//! - [`Shape`] and [`ShapeType`] describe one geometry record using `geo`
//!   primitives.
//! - [`Field`] and [`FieldType`] describe the attribute-table schema.
//! - [`SequentialReader`] is the cursor protocol advancing both streams in
//!   lockstep, and [`Companion`] models the optional attribute stream.
//! - [`EntryNaming`] configures how geometry entries and their companions
//!   are recognised by name.
//!
//! Decoding and archive access live in `shpzip-data`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod field;
mod naming;
mod reader;
mod shape;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use error::{CloseError, ReadError, StreamKind};
pub use field::{Field, FieldType};
pub use naming::EntryNaming;
pub use reader::{Companion, SequentialReader};
pub use shape::{Shape, ShapeType};
