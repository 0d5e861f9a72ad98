//! Filesystem helpers for opening datasets, built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::fs::File;
use std::io;

/// Open a UTF-8 file path for reading using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<File> {
    fs_utf8::File::open_ambient(path, ambient_authority()).map(fs_utf8::File::into_std)
}

/// Open a file that may legitimately be missing.
///
/// `NotFound` maps to `Ok(None)`; every other failure is returned unchanged
/// so callers can decide whether an unreadable file matters.
pub fn open_optional_utf8_file(path: &Utf8Path) -> io::Result<Option<File>> {
    match open_utf8_file(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}
