//! Entry resolution over an archive's flat namespace.
//!
//! Everything here is a pure function of the entry list; nothing is opened.

use log::debug;
use shpzip_core::{Companion, EntryNaming};

use super::ArchiveError;

/// Name and uncompressed size of one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path-like entry name using forward slashes.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// How the primary geometry entry is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRequest<'a> {
    /// The archive must contain exactly one geometry entry.
    Single,
    /// The entry with exactly this name.
    Named(&'a str),
}

/// A resolved primary entry and its optional companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPair<'a> {
    /// The geometry entry.
    pub primary: &'a ArchiveEntry,
    /// The attribute entry, when one exists under the derived name.
    pub companion: Companion<&'a ArchiveEntry>,
}

/// Geometry entries in archive order.
pub fn shape_entries<'a, 'n>(
    entries: &'a [ArchiveEntry],
    naming: &'n EntryNaming,
) -> impl Iterator<Item = &'a ArchiveEntry> + use<'a, 'n> {
    entries
        .iter()
        .filter(move |entry| naming.is_shape_entry(&entry.name))
}

/// Resolve the primary entry for `request`.
///
/// # Errors
/// [`ArchiveError::EntryNotFound`] when nothing matches and
/// [`ArchiveError::AmbiguousEntry`] when [`EntryRequest::Single`] matches
/// more than one entry.
pub fn resolve_primary<'a>(
    entries: &'a [ArchiveEntry],
    request: EntryRequest<'_>,
    naming: &EntryNaming,
) -> Result<&'a ArchiveEntry, ArchiveError> {
    match request {
        EntryRequest::Named(name) => entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ArchiveError::EntryNotFound {
                name: name.to_owned(),
            }),
        EntryRequest::Single => {
            let mut matches = shape_entries(entries, naming);
            match (matches.next(), matches.next()) {
                (Some(only), None) => Ok(only),
                (None, _) => Err(ArchiveError::EntryNotFound {
                    name: format!("*{}", naming.shape_extension()),
                }),
                (Some(_), Some(_)) => Err(ArchiveError::AmbiguousEntry {
                    candidates: shape_entries(entries, naming)
                        .map(|entry| entry.name.clone())
                        .collect(),
                }),
            }
        }
    }
}

/// Look up the companion of `primary` by its derived name.
///
/// Absence is reported as [`Companion::Absent`], never as an error.
#[must_use]
pub fn resolve_companion<'a>(
    entries: &'a [ArchiveEntry],
    primary: &str,
    naming: &EntryNaming,
) -> Companion<&'a ArchiveEntry> {
    let derived = naming.companion_name(primary);
    match entries.iter().find(|entry| entry.name == derived) {
        Some(entry) => Companion::Present(entry),
        None => {
            debug!("no companion entry {derived:?} for {primary:?}");
            Companion::Absent
        }
    }
}

/// Resolve the primary entry and its companion in one step.
///
/// # Errors
/// Propagates the errors of [`resolve_primary`].
pub fn resolve_pair<'a>(
    entries: &'a [ArchiveEntry],
    request: EntryRequest<'_>,
    naming: &EntryNaming,
) -> Result<EntryPair<'a>, ArchiveError> {
    let primary = resolve_primary(entries, request, naming)?;
    let companion = resolve_companion(entries, &primary.name, naming);
    debug!(
        "resolved primary entry {:?} (companion {})",
        primary.name,
        if companion.is_present() { "present" } else { "absent" }
    );
    Ok(EntryPair { primary, companion })
}
